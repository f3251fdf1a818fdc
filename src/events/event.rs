//! # Events emitted by pollers.
//!
//! The [`EventKind`] enum classifies what happened:
//! - **Lifecycle events**: started, stopped, destroyed
//! - **Invocation events**: starting, succeeded, failed
//! - **Scheduling events**: next invocation scheduled (with delay and source)
//!
//! The [`Event`] struct carries metadata such as timestamps, poller name,
//! error count and delays.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use pollvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::NextScheduled)
//!     .with_poller("feed")
//!     .with_error_count(2)
//!     .with_delay(Duration::from_secs(4));
//!
//! assert_eq!(ev.kind, EventKind::NextScheduled);
//! assert_eq!(ev.poller.as_deref(), Some("feed"));
//! assert_eq!(ev.delay_ms, Some(4000));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of poller events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Poller was started and its first invocation armed.
    ///
    /// Sets:
    /// - `poller`: poller name
    /// - `delay_ms`: delay before the first invocation (0 when forced)
    /// - `error_count`: preserved error count
    PollerStarted,

    /// Poller was stopped; pending timers and continuations are cancelled.
    ///
    /// Sets:
    /// - `poller`: poller name
    /// - `error_count`: preserved error count
    PollerStopped,

    /// Poller was destroyed and its name released.
    ///
    /// Sets:
    /// - `poller`: poller name
    PollerDestroyed,

    /// An invocation of the action is starting.
    ///
    /// Sets:
    /// - `poller`: poller name
    /// - `invocation`: invocation number (1-based, never resets)
    InvocationStarting,

    /// The action succeeded; the result was delivered to subscribers.
    ///
    /// Sets:
    /// - `poller`: poller name
    /// - `invocation`: invocation number
    InvocationSucceeded,

    /// The action failed; the failure is absorbed by backoff.
    ///
    /// Sets:
    /// - `poller`: poller name
    /// - `invocation`: invocation number
    /// - `error_count`: consecutive failures including this one
    /// - `reason`: failure message
    InvocationFailed,

    /// Next invocation scheduled (after success or failure).
    ///
    /// Sets:
    /// - `poller`: poller name
    /// - `invocation`: the invocation that just settled
    /// - `delay_ms`: delay before the next invocation
    /// - `error_count`: current error count
    /// - `backoff_source`: `Success` or `Failure`
    NextScheduled,
}

/// Reason for scheduling the next invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffSource {
    /// Last invocation succeeded; the delay is the plain interval.
    Success,
    /// Last invocation failed; the delay is backed off.
    Failure,
}

/// Poller event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Name of the poller.
    pub poller: Option<Arc<str>>,
    /// Invocation number (starting from 1).
    pub invocation: Option<u64>,
    /// Consecutive failures at the time of the event.
    pub error_count: Option<u32>,
    /// Delay before the next invocation in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Human-readable reason (failures).
    pub reason: Option<Arc<str>>,
    /// Source for the scheduled delay (success vs failure).
    pub backoff_source: Option<BackoffSource>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            poller: None,
            invocation: None,
            error_count: None,
            delay_ms: None,
            reason: None,
            backoff_source: None,
        }
    }

    /// Attaches a poller name.
    #[inline]
    pub fn with_poller(mut self, poller: impl Into<Arc<str>>) -> Self {
        self.poller = Some(poller.into());
        self
    }

    /// Attaches an invocation number.
    #[inline]
    pub fn with_invocation(mut self, n: u64) -> Self {
        self.invocation = Some(n);
        self
    }

    /// Attaches the current error count.
    #[inline]
    pub fn with_error_count(mut self, n: u32) -> Self {
        self.error_count = Some(n);
        self
    }

    /// Attaches a delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Marks that this delay follows a successful invocation.
    #[inline]
    pub fn with_backoff_success(mut self) -> Self {
        self.backoff_source = Some(BackoffSource::Success);
        self
    }

    /// Marks that this delay follows a failed invocation.
    #[inline]
    pub fn with_backoff_failure(mut self) -> Self {
        self.backoff_source = Some(BackoffSource::Failure);
        self
    }

    /// Delay as a [`Duration`], if set.
    #[inline]
    pub fn delay(&self) -> Option<Duration> {
        self.delay_ms.map(|ms| Duration::from_millis(u64::from(ms)))
    }
}
