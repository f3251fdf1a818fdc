//! # PollEngine: the scheduling/backoff state machine of one poller.
//!
//! The engine owns the [`PollState`], the live [`Connection`] and the subscriber set,
//! and drives repeated invocation of the current action.
//!
//! ## Event flow
//! For each invocation the engine publishes:
//! ```text
//! InvocationStarting → [action] → InvocationSucceeded → (results to subscribers)
//!                               → InvocationFailed
//! then:
//!   → NextScheduled → [sleep] → next invocation
//! ```
//!
//! ## Architecture
//! ```text
//! start(force) ──► Connection { token, join } ──► tokio::spawn(drive)
//!
//! drive:
//!   ├─► sleep(force ? 0 : interval)                       (cancellable)
//!   loop {
//!   ├─► launch():  gate ─► check token ─► spawn(action.run())
//!   ├─► await join handle                                 (cancellable)
//!   ├─► settle():  gate ─► check token
//!   │     ├─ Ok  ─► error_count = 0   ─► emit to subscribers
//!   │     └─ Err ─► error_count += 1
//!   │     └─► delay = min(interval × 2^error_count, max_interval)
//!   └─► sleep(delay)                                      (cancellable)
//!   }
//! ```
//!
//! ## Rules
//! - Invocations run **sequentially**; the delay starts after the previous one settled.
//! - Config and action are read as one snapshot per decision.
//! - `stop()` cancels the connection token under the gate: once it returns, no
//!   invocation, state update or delivery happens for that connection. An action in
//!   flight keeps running detached and its outcome is discarded.
//! - The gate is reentrant so subscriber callbacks may call `stop()`/`start()`.
//! - `destroy()` sets its flag under the gate; `start()` checks it there.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::{Mutex, ReentrantMutex, RwLock};
use tokio::task::{JoinError, JoinHandle};
use tokio::{select, time};
use tokio_util::sync::CancellationToken;

use crate::{
    actions::ActionRef,
    config::{ConfigUpdate, PollerConfig},
    core::state::{PollState, PollStatus},
    error::{ActionError, PollerError},
    events::{Bus, Event, EventKind},
    subscribers::{SubscriberSet, panic_message},
};

/// Live handle of a started engine.
///
/// Dropping it cancels its token, which halts every timer and continuation
/// scheduled under it, and aborts the driver task. The action task is separate
/// and is left to finish.
struct Connection {
    token: CancellationToken,
    join: JoinHandle<()>,
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.token.cancel();
        self.join.abort();
    }
}

/// Scheduling engine of one poller.
pub(crate) struct PollEngine<T> {
    name: Arc<str>,
    config: RwLock<PollerConfig>,
    action: RwLock<Option<ActionRef<T>>>,
    subs: Arc<SubscriberSet<T>>,
    state: Mutex<PollState>,
    /// Serializes check-apply-deliver sections against `stop`.
    gate: ReentrantMutex<()>,
    connection: Mutex<Option<Connection>>,
    /// Set once under the gate; a destroyed engine never starts again.
    destroyed: AtomicBool,
    bus: Bus,
}

impl<T> PollEngine<T> {
    pub(crate) fn new(name: Arc<str>, config: PollerConfig, bus: Bus) -> Arc<Self> {
        Arc::new(Self {
            name,
            config: RwLock::new(config),
            action: RwLock::new(None),
            subs: Arc::new(SubscriberSet::new()),
            state: Mutex::new(PollState::default()),
            gate: ReentrantMutex::new(()),
            connection: Mutex::new(None),
            destroyed: AtomicBool::new(false),
            bus,
        })
    }

    pub(crate) fn subscribers(&self) -> &Arc<SubscriberSet<T>> {
        &self.subs
    }

    pub(crate) fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Replaces the action; used from the next invocation on.
    pub(crate) fn set_action(&self, action: ActionRef<T>) {
        *self.action.write() = Some(action);
    }

    /// Merges a partial config; used from the next scheduling decision on.
    pub(crate) fn set_config(&self, update: &ConfigUpdate) -> PollerConfig {
        let mut cfg = self.config.write();
        cfg.merge(update);
        tracing::debug!(
            poller = %self.name,
            interval_ms = cfg.interval.as_millis() as u64,
            max_interval_ms = cfg.max_interval.as_millis() as u64,
            "config updated"
        );
        *cfg
    }

    pub(crate) fn config(&self) -> PollerConfig {
        *self.config.read()
    }

    pub(crate) fn status(&self) -> PollStatus {
        self.state.lock().status()
    }

    pub(crate) fn is_running(&self) -> bool {
        self.connection.lock().is_some()
    }

    pub(crate) fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    /// Marks the engine destroyed and stops it. Returns `false` if it already was.
    ///
    /// Runs under the gate, so a concurrent `start` either completes before and is
    /// stopped here, or observes the flag and fails.
    pub(crate) fn destroy(&self) -> bool {
        let _gate = self.gate.lock();
        if self.destroyed.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.stop();
        true
    }

    /// Disposes the connection. Returns `false` if the engine was idle.
    pub(crate) fn stop(&self) -> bool {
        let _gate = self.gate.lock();
        let Some(connection) = self.connection.lock().take() else {
            return false;
        };
        drop(connection);

        let error_count = {
            let mut state = self.state.lock();
            state.disarm();
            state.error_count()
        };
        self.bus.publish(
            Event::new(EventKind::PollerStopped)
                .with_poller(self.name.clone())
                .with_error_count(error_count),
        );
        true
    }
}

impl<T: Send + 'static> PollEngine<T> {
    /// Establishes a connection and arms the first invocation.
    ///
    /// Only valid while idle. The first invocation fires immediately when
    /// `force_start` is set, otherwise after one `interval` (not backoff-adjusted).
    pub(crate) fn start(self: &Arc<Self>, force_start: bool) -> Result<(), PollerError> {
        let _gate = self.gate.lock();
        if self.is_destroyed() {
            return Err(PollerError::Destroyed {
                name: self.name.to_string(),
            });
        }
        let mut connection = self.connection.lock();
        if connection.is_some() {
            return Err(PollerError::AlreadyStarted {
                name: self.name.to_string(),
            });
        }
        if self.action.read().is_none() {
            return Err(PollerError::MissingAction {
                name: self.name.to_string(),
            });
        }
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| PollerError::NoRuntime {
                name: self.name.to_string(),
            })?;

        let first_delay = if force_start {
            Duration::ZERO
        } else {
            self.config.read().interval
        };
        let error_count = {
            let mut state = self.state.lock();
            state.arm(first_delay);
            state.error_count()
        };

        let token = CancellationToken::new();
        let join = runtime.spawn(Arc::clone(self).drive(token.clone(), first_delay));
        *connection = Some(Connection { token, join });

        self.bus.publish(
            Event::new(EventKind::PollerStarted)
                .with_poller(self.name.clone())
                .with_delay(first_delay)
                .with_error_count(error_count),
        );
        Ok(())
    }

    /// Main loop of one connection.
    async fn drive(self: Arc<Self>, token: CancellationToken, first_delay: Duration) {
        if !sleep_or_cancel(first_delay, &token).await {
            return;
        }
        loop {
            let Some((invocation, handle)) = self.launch(&token) else {
                return;
            };

            let joined = select! {
                biased;
                _ = token.cancelled() => {
                    tracing::debug!(
                        poller = %self.name,
                        invocation,
                        "stopped with invocation in flight; its outcome will be discarded"
                    );
                    return;
                }
                joined = handle => joined,
            };
            let outcome = joined.unwrap_or_else(|e| {
                Err(ActionError::Panicked {
                    reason: join_error_reason(e),
                })
            });

            let Some(delay) = self.settle(&token, invocation, outcome) else {
                return;
            };
            if !sleep_or_cancel(delay, &token).await {
                return;
            }
        }
    }

    /// Starts one invocation of the current action on its own task.
    fn launch(
        &self,
        token: &CancellationToken,
    ) -> Option<(u64, JoinHandle<Result<T, ActionError>>)> {
        let _gate = self.gate.lock();
        if token.is_cancelled() {
            return None;
        }
        let action = self.action.read().clone()?;
        let invocation = self.state.lock().begin_invocation();

        self.bus.publish(
            Event::new(EventKind::InvocationStarting)
                .with_poller(self.name.clone())
                .with_invocation(invocation),
        );
        let handle = tokio::spawn(async move { action.run().await });
        Some((invocation, handle))
    }

    /// Applies a settled outcome and returns the delay before the next invocation.
    ///
    /// Returns `None` when the connection was cancelled, in which case the outcome
    /// is discarded without touching the state.
    fn settle(
        &self,
        token: &CancellationToken,
        invocation: u64,
        outcome: Result<T, ActionError>,
    ) -> Option<Duration> {
        let _gate = self.gate.lock();
        if token.is_cancelled() {
            tracing::debug!(poller = %self.name, invocation, "late completion discarded");
            return None;
        }
        let backoff = self.config.read().backoff();

        let (delay, error_count, event) = match outcome {
            Ok(value) => {
                let delay = self.state.lock().record_success(&backoff);
                self.bus.publish(
                    Event::new(EventKind::InvocationSucceeded)
                        .with_poller(self.name.clone())
                        .with_invocation(invocation),
                );
                self.subs.emit(&value);
                // A subscriber may have stopped the poller.
                if token.is_cancelled() {
                    return None;
                }
                (delay, 0, Event::new(EventKind::NextScheduled).with_backoff_success())
            }
            Err(err) => {
                let (delay, error_count) = {
                    let mut state = self.state.lock();
                    let delay = state.record_failure(&backoff);
                    (delay, state.error_count())
                };
                self.bus.publish(
                    Event::new(EventKind::InvocationFailed)
                        .with_poller(self.name.clone())
                        .with_invocation(invocation)
                        .with_error_count(error_count)
                        .with_reason(err.reason()),
                );
                (
                    delay,
                    error_count,
                    Event::new(EventKind::NextScheduled).with_backoff_failure(),
                )
            }
        };

        self.bus.publish(
            event
                .with_poller(self.name.clone())
                .with_invocation(invocation)
                .with_error_count(error_count)
                .with_delay(delay),
        );
        Some(delay)
    }
}

/// Sleeps for `delay`; returns `false` if `token` was cancelled first.
async fn sleep_or_cancel(delay: Duration, token: &CancellationToken) -> bool {
    select! {
        biased;
        _ = token.cancelled() => false,
        _ = time::sleep(delay) => true,
    }
}

fn join_error_reason(err: JoinError) -> String {
    if err.is_panic() {
        panic_message(&*err.into_panic())
    } else {
        err.to_string()
    }
}
