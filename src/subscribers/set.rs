//! # SubscriberSet: ordered fan-out of results
//!
//! [`SubscriberSet`] delivers each successful result to every registered subscriber.
//!
//! ## What it guarantees
//! - Every subscriber sees every result emitted after it subscribed, exactly once.
//! - Results reach a subscriber in emit order (the engine emits in invocation order).
//! - Panics inside subscribers are caught and logged (isolation).
//! - Subscribing/unsubscribing from inside a callback is allowed; the change applies
//!   from the next emit.
//!
//! ## Diagram
//! ```text
//!    emit(&T)
//!        │   (snapshot of current subscribers)
//!        ├────────► S1.on_result(&T)
//!        ├────────► S2.on_result(&T)
//!        └────────► SN.on_result(&T)
//! ```

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use super::Subscribe;

/// Identifier of one subscription within a [`SubscriberSet`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Ordered set of result subscribers.
pub struct SubscriberSet<T> {
    next_id: AtomicU64,
    entries: RwLock<Vec<(SubscriptionId, Arc<dyn Subscribe<T>>)>>,
}

impl<T> Default for SubscriberSet<T> {
    fn default() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            entries: RwLock::new(Vec::new()),
        }
    }
}

impl<T> SubscriberSet<T> {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a subscriber and returns its id.
    pub fn add(&self, sub: Arc<dyn Subscribe<T>>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries.write().push((id, sub));
        id
    }

    /// Removes a subscriber. Returns `false` if it was not present.
    pub fn remove(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|(sid, _)| *sid != id);
        entries.len() != before
    }

    /// Delivers `value` to every current subscriber.
    pub fn emit(&self, value: &T)
    where
        T: 'static,
    {
        let snapshot: Vec<Arc<dyn Subscribe<T>>> =
            self.entries.read().iter().map(|(_, s)| Arc::clone(s)).collect();

        for sub in snapshot {
            if let Err(panic_err) = catch_unwind(AssertUnwindSafe(|| sub.on_result(value))) {
                tracing::warn!(
                    subscriber = sub.name(),
                    info = panic_message(&*panic_err),
                    "subscriber panicked"
                );
            }
        }
    }

    /// True if there are no subscribers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Number of subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }
}

/// Handle returned by [`Poller::subscribe`](crate::Poller::subscribe).
///
/// Dropping the handle keeps the subscription alive; call
/// [`Subscription::unsubscribe`] to stop receiving results.
pub struct Subscription<T> {
    id: SubscriptionId,
    set: Weak<SubscriberSet<T>>,
}

impl<T> Subscription<T> {
    pub(crate) fn new(id: SubscriptionId, set: &Arc<SubscriberSet<T>>) -> Self {
        Self {
            id,
            set: Arc::downgrade(set),
        }
    }

    /// Id of this subscription.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Removes the subscriber. Returns `false` if it was already gone.
    pub fn unsubscribe(self) -> bool {
        self.set.upgrade().is_some_and(|set| set.remove(self.id))
    }
}

impl<T> Clone for Subscription<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            set: Weak::clone(&self.set),
        }
    }
}

impl<T> std::fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

pub(crate) fn panic_message(err: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
