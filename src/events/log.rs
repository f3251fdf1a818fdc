//! # LogWriter — poller events to `tracing`
//!
//! A small observer that drains a poller's [`Bus`](crate::events::Bus) receiver and
//! writes every [`Event`] through `tracing`.
//!
//! ## Example output
//! ```text
//! INFO  poller="feed" [started] delay_ms=0 error_count=0
//! DEBUG poller="feed" [invoking] invocation=1
//! WARN  poller="feed" [failed] invocation=1 error_count=1 reason="connection refused"
//! DEBUG poller="feed" [scheduled] delay_ms=2000 error_count=1 source=Failure
//! INFO  poller="feed" [stopped] error_count=1
//! ```

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

use crate::events::{Event, EventKind};

/// Event writer backed by `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Spawns a task that logs every event received on `rx` until the bus closes.
    pub fn spawn(self, mut rx: broadcast::Receiver<Event>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => self.write(&ev),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "[lagged] log writer skipped events");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    /// Writes a single event.
    pub fn write(&self, e: &Event) {
        let poller = e.poller.as_deref().unwrap_or("unknown");
        match e.kind {
            EventKind::PollerStarted => {
                tracing::info!(poller, delay_ms = ?e.delay_ms, error_count = ?e.error_count, "[started]");
            }
            EventKind::PollerStopped => {
                tracing::info!(poller, error_count = ?e.error_count, "[stopped]");
            }
            EventKind::PollerDestroyed => {
                tracing::info!(poller, "[destroyed]");
            }
            EventKind::InvocationStarting => {
                tracing::debug!(poller, invocation = ?e.invocation, "[invoking]");
            }
            EventKind::InvocationSucceeded => {
                tracing::debug!(poller, invocation = ?e.invocation, "[succeeded]");
            }
            EventKind::InvocationFailed => {
                tracing::warn!(
                    poller,
                    invocation = ?e.invocation,
                    error_count = ?e.error_count,
                    reason = e.reason.as_deref().unwrap_or(""),
                    "[failed]"
                );
            }
            EventKind::NextScheduled => {
                tracing::debug!(
                    poller,
                    delay_ms = ?e.delay_ms,
                    error_count = ?e.error_count,
                    source = ?e.backoff_source,
                    "[scheduled]"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;

    #[test]
    #[traced_test]
    fn test_failed_event_is_logged_with_reason() {
        LogWriter::new().write(
            &Event::new(EventKind::InvocationFailed)
                .with_poller("feed")
                .with_invocation(3)
                .with_error_count(2)
                .with_reason("connection refused"),
        );
        assert!(logs_contain("[failed]"));
        assert!(logs_contain("connection refused"));
    }

    #[test]
    #[traced_test]
    fn test_scheduled_event_is_debug() {
        LogWriter::new().write(
            &Event::new(EventKind::NextScheduled)
                .with_poller("feed")
                .with_delay(std::time::Duration::from_millis(2000))
                .with_backoff_failure(),
        );
        assert!(logs_contain("[scheduled]"));
        assert!(logs_contain("delay_ms=Some(2000)"));
    }

    #[tokio::test]
    async fn test_spawned_writer_exits_when_bus_closes() {
        let bus = crate::events::Bus::new(8);
        let handle = LogWriter::new().spawn(bus.subscribe());

        bus.publish(Event::new(EventKind::PollerStarted).with_poller("drained"));
        drop(bus);

        handle.await.unwrap();
    }
}
