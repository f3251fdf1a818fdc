//! # Poll state: error counter, phase and last computed delay.
//!
//! [`PollState`] is owned by one engine and mutated only through its transition
//! methods. It survives `stop`/`start`; only a successful invocation resets the
//! error count.
//!
//! ## Phases
//! ```text
//!          start(force)             delay elapsed
//!  Idle ───────────────► Armed ───────────────────► Invoking
//!   ▲                                                 │   ▲
//!   │ stop() from any phase                 settled   │   │ delay elapsed
//!   └──────────────────────────────────── Waiting ◄───┘   │
//!                                            └────────────┘
//! ```

use std::time::Duration;

use crate::policies::BackoffPolicy;

/// Phase of the poll state machine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PollPhase {
    /// No connection; nothing scheduled.
    #[default]
    Idle,
    /// Started; waiting for the first invocation.
    Armed,
    /// Action in flight.
    Invoking,
    /// Action settled; timer counting down to the next invocation.
    Waiting,
}

/// Read-only snapshot of a poller's state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollStatus {
    /// Current phase.
    pub phase: PollPhase,
    /// Consecutive failures since the last success.
    pub error_count: u32,
    /// Last delay scheduled (first delay while armed).
    pub next_delay: Option<Duration>,
    /// Number of invocations started so far.
    pub invocations: u64,
}

/// Mutable backoff state of one engine.
#[derive(Debug, Default)]
pub(crate) struct PollState {
    phase: PollPhase,
    error_count: u32,
    next_delay: Option<Duration>,
    invocations: u64,
}

impl PollState {
    /// Connection established; first invocation after `first_delay`.
    pub(crate) fn arm(&mut self, first_delay: Duration) {
        self.phase = PollPhase::Armed;
        self.next_delay = Some(first_delay);
    }

    /// Connection disposed. Error count is preserved.
    pub(crate) fn disarm(&mut self) {
        self.phase = PollPhase::Idle;
    }

    /// An invocation starts; returns its 1-based number.
    pub(crate) fn begin_invocation(&mut self) -> u64 {
        self.phase = PollPhase::Invoking;
        self.invocations += 1;
        self.invocations
    }

    /// Success: resets the error count and returns the next delay.
    pub(crate) fn record_success(&mut self, backoff: &BackoffPolicy) -> Duration {
        self.error_count = 0;
        self.schedule(backoff)
    }

    /// Failure: increments the error count and returns the backed-off delay.
    pub(crate) fn record_failure(&mut self, backoff: &BackoffPolicy) -> Duration {
        self.error_count = self.error_count.saturating_add(1);
        self.schedule(backoff)
    }

    fn schedule(&mut self, backoff: &BackoffPolicy) -> Duration {
        let delay = backoff.next(self.error_count);
        self.next_delay = Some(delay);
        self.phase = PollPhase::Waiting;
        delay
    }

    /// Consecutive failures since the last success.
    #[inline]
    pub(crate) fn error_count(&self) -> u32 {
        self.error_count
    }

    /// Snapshot for external readers.
    pub(crate) fn status(&self) -> PollStatus {
        PollStatus {
            phase: self.phase,
            error_count: self.error_count,
            next_delay: self.next_delay,
            invocations: self.invocations,
        }
    }
}
