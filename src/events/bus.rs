//! # Event bus for broadcasting poller events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`]. Every poller owns one;
//! its engine publishes lifecycle events and any number of observers (the
//! [`LogWriter`](crate::LogWriter), tests, host dashboards) subscribe.
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks.
//! - **Bounded capacity**: slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - **No persistence**: events are lost if there are no receivers at send time.
//!
//! Result delivery does **not** go through the bus: results reach subscribers through
//! the [`SubscriberSet`](crate::SubscriberSet), which never drops.

use tokio::sync::broadcast;

use super::event::Event;

/// Default ring buffer size of a poller's bus.
pub const DEFAULT_BUS_CAPACITY: usize = 256;

/// Broadcast channel for poller events.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all active receivers; dropped when there are none.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a receiver that observes events sent after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new(DEFAULT_BUS_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn test_receiver_sees_only_later_events() {
        let bus = Bus::new(8);
        bus.publish(Event::new(EventKind::PollerStarted));

        let mut rx = bus.subscribe();
        bus.publish(Event::new(EventKind::PollerStopped).with_poller("p"));

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::PollerStopped);
        assert!(rx.try_recv().is_err());
    }
}
