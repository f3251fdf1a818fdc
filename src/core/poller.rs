//! # Poller: the public facade.
//!
//! A [`Poller`] binds a name, a [`PollerConfig`], an action and a poll engine, and is
//! registered in a [`PollerRegistry`] under its name. It is a cheap `Clone` handle;
//! the poller stops and frees its name when the last handle is dropped.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use pollvisor::{ActionError, ConfigUpdate, Poller};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let poller: Poller<u64> = Poller::create(
//!         "doc-example",
//!         Some(ConfigUpdate::new().interval(Duration::from_millis(10))),
//!     )?;
//!
//!     poller.set_action(|| async { Ok::<_, ActionError>(42) });
//!     poller.subscribe(|n: &u64| println!("polled {n}"));
//!     poller.start(true)?;
//!
//!     tokio::time::sleep(Duration::from_millis(25)).await;
//!     poller.destroy();
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::broadcast;

use crate::{
    actions::{ActionFn, ActionRef},
    config::{ConfigUpdate, PollerConfig},
    core::{
        engine::PollEngine,
        registry::PollerRegistry,
        state::PollStatus,
    },
    error::{ActionError, PollerError},
    events::{Bus, DEFAULT_BUS_CAPACITY, Event, EventKind},
    subscribers::{Subscribe, Subscription, SubscriptionId},
};

static POLLER_ID: AtomicU64 = AtomicU64::new(1);

/// Shared state behind every [`Poller`] handle.
pub(crate) struct PollerInner<T> {
    id: u64,
    name: Arc<str>,
    engine: Arc<PollEngine<T>>,
    registry: Arc<PollerRegistry>,
}

impl<T> Drop for PollerInner<T> {
    fn drop(&mut self) {
        self.engine.stop();
        self.registry.remove_if(&self.name, self.id);
    }
}

/// Named, independently scheduled polling instance.
pub struct Poller<T> {
    inner: Arc<PollerInner<T>>,
}

impl<T> Clone for Poller<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> std::fmt::Debug for Poller<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Poller")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .finish()
    }
}

impl<T: Send + 'static> Poller<T> {
    /// Creates a poller registered in the [global registry](PollerRegistry::global).
    ///
    /// Fails with [`PollerError::DuplicateName`] if `name` is held by a live poller.
    pub fn create(
        name: impl Into<String>,
        config: Option<ConfigUpdate>,
    ) -> Result<Self, PollerError> {
        let mut builder = Self::builder(name);
        if let Some(update) = config {
            builder = builder.config(update);
        }
        builder.build()
    }

    /// Starts building a poller.
    pub fn builder(name: impl Into<String>) -> PollerBuilder<T> {
        PollerBuilder::new(name)
    }

    pub(crate) fn from_inner(inner: Arc<PollerInner<T>>) -> Self {
        Self { inner }
    }

    pub(crate) fn inner(&self) -> &Arc<PollerInner<T>> {
        &self.inner
    }

    /// Unique identity of this instance (names can be reused after destroy).
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Poller name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Sets the action from a closure; takes effect from the next invocation.
    pub fn set_action<F, Fut>(&self, f: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ActionError>> + Send + 'static,
    {
        self.set_action_ref(ActionFn::arc(f));
    }

    /// Sets a shared action; takes effect from the next invocation.
    pub fn set_action_ref(&self, action: ActionRef<T>) {
        self.inner.engine.set_action(action);
    }

    /// Merges a partial config and returns the effective one.
    ///
    /// A change made while running affects the next scheduling decision; the
    /// in-flight action is not aborted.
    pub fn set_config(&self, update: ConfigUpdate) -> PollerConfig {
        self.inner.engine.set_config(&update)
    }

    /// Current effective config.
    pub fn config(&self) -> PollerConfig {
        self.inner.engine.config()
    }

    /// Registers a callback for every successful result from now on.
    ///
    /// A callback that captures a strong [`Poller`] handle keeps the poller alive;
    /// capture a clone only if the poller is destroyed explicitly.
    pub fn subscribe<F>(&self, callback: F) -> Subscription<T>
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.subscribe_with(Arc::new(callback))
    }

    /// Registers a subscriber for every successful result from now on.
    pub fn subscribe_with(&self, subscriber: Arc<dyn Subscribe<T>>) -> Subscription<T> {
        let set = self.inner.engine.subscribers();
        Subscription::new(set.add(subscriber), set)
    }

    /// Removes a subscriber. Returns `false` if it was not present.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.engine.subscribers().remove(id)
    }

    /// Starts polling.
    ///
    /// The first invocation fires immediately when `force_start` is set, otherwise
    /// after one `interval`. The error count left by an earlier run is kept.
    ///
    /// ### Errors
    /// - [`PollerError::AlreadyStarted`] when running;
    /// - [`PollerError::MissingAction`] when no action was set;
    /// - [`PollerError::Destroyed`] after [`Poller::destroy`];
    /// - [`PollerError::NoRuntime`] outside a tokio runtime.
    pub fn start(&self, force_start: bool) -> Result<(), PollerError> {
        self.inner.engine.start(force_start)
    }

    /// Stops polling. Returns `false` if the poller was not running.
    ///
    /// No invocation or delivery happens after this returns; an in-flight action
    /// finishes in the background and its outcome is discarded.
    pub fn stop(&self) -> bool {
        self.inner.engine.stop()
    }

    /// Stops polling and releases the name in the registry for good.
    pub fn destroy(&self) {
        if !self.inner.engine.destroy() {
            return;
        }
        self.inner.registry.remove_if(&self.inner.name, self.inner.id);
        self.inner.engine.bus().publish(
            Event::new(EventKind::PollerDestroyed).with_poller(self.inner.name.clone()),
        );
    }

    /// True while started.
    pub fn is_running(&self) -> bool {
        self.inner.engine.is_running()
    }

    /// True after [`Poller::destroy`].
    pub fn is_destroyed(&self) -> bool {
        self.inner.engine.is_destroyed()
    }

    /// Snapshot of the scheduling state.
    pub fn status(&self) -> PollStatus {
        self.inner.engine.status()
    }

    /// Consecutive failures since the last success.
    pub fn error_count(&self) -> u32 {
        self.status().error_count
    }

    /// Subscribes to this poller's lifecycle events.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.inner.engine.bus().subscribe()
    }
}

/// Builder for a [`Poller`].
pub struct PollerBuilder<T> {
    name: String,
    config: ConfigUpdate,
    action: Option<ActionRef<T>>,
    registry: Option<Arc<PollerRegistry>>,
    bus_capacity: usize,
}

impl<T: Send + 'static> PollerBuilder<T> {
    /// Creates a builder for a poller named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: ConfigUpdate::default(),
            action: None,
            registry: None,
            bus_capacity: DEFAULT_BUS_CAPACITY,
        }
    }

    /// Initial config (merged over the defaults).
    pub fn config(mut self, update: ConfigUpdate) -> Self {
        self.config = update;
        self
    }

    /// Initial action.
    pub fn action(mut self, action: ActionRef<T>) -> Self {
        self.action = Some(action);
        self
    }

    /// Registry to register in (defaults to [`PollerRegistry::global`]).
    pub fn registry(mut self, registry: Arc<PollerRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Capacity of the event bus (minimum 1).
    pub fn bus_capacity(mut self, capacity: usize) -> Self {
        self.bus_capacity = capacity;
        self
    }

    /// Creates the poller and registers it under its name.
    pub fn build(self) -> Result<Poller<T>, PollerError> {
        let registry = self.registry.unwrap_or_else(PollerRegistry::global);
        let name: Arc<str> = Arc::from(self.name);
        let engine = PollEngine::new(
            name.clone(),
            PollerConfig::from_update(&self.config),
            Bus::new(self.bus_capacity),
        );
        if let Some(action) = self.action {
            engine.set_action(action);
        }

        let poller = Poller::from_inner(Arc::new(PollerInner {
            id: POLLER_ID.fetch_add(1, Ordering::Relaxed),
            name,
            engine,
            registry: Arc::clone(&registry),
        }));
        registry.register(&poller)?;
        Ok(poller)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;

    use parking_lot::Mutex;
    use tokio::time;

    use super::*;
    use crate::core::state::PollPhase;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn build(reg: &Arc<PollerRegistry>, name: &str, interval: u64, max: u64) -> Poller<u32> {
        Poller::builder(name)
            .registry(reg.clone())
            .config(ConfigUpdate::new().interval(ms(interval)).max_interval(ms(max)))
            .build()
            .unwrap()
    }

    fn counting(poller: &Poller<u32>) -> Arc<AtomicU32> {
        let n = Arc::new(AtomicU32::new(0));
        poller.set_action({
            let n = n.clone();
            move || {
                let v = n.fetch_add(1, Ordering::SeqCst) + 1;
                async move { Ok(v) }
            }
        });
        n
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_with_defaults_and_partial_config() {
        let p: Poller<u32> = Poller::create("poller-defaults-test", None).unwrap();
        assert_eq!(p.config().interval, ms(8_000));
        assert_eq!(p.config().max_interval, ms(300_000));

        p.set_config(ConfigUpdate::new().interval(ms(5_000)).max_interval(ms(40_000)));
        let cfg = p.set_config(ConfigUpdate::new().interval(ms(6_000)));
        assert_eq!(cfg.interval, ms(6_000));
        assert_eq!(cfg.max_interval, ms(40_000));

        assert!(PollerRegistry::global().contains("poller-defaults-test"));
        p.destroy();
        assert!(!PollerRegistry::global().contains("poller-defaults-test"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_false_waits_one_interval() {
        let reg = PollerRegistry::new();
        let p = build(&reg, "lazy", 1000, 10_000);
        let n = counting(&p);

        p.start(false).unwrap();
        assert_eq!(p.status().phase, PollPhase::Armed);
        time::sleep(ms(999)).await;
        assert_eq!(n.load(Ordering::SeqCst), 0);
        time::sleep(ms(2)).await;
        assert_eq!(n.load(Ordering::SeqCst), 1);
        p.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_receive_results_in_order() {
        let reg = PollerRegistry::new();
        let p = build(&reg, "ordered", 1000, 10_000);
        counting(&p);

        let a = Arc::new(Mutex::new(Vec::new()));
        let b = Arc::new(Mutex::new(Vec::new()));
        p.subscribe({
            let a = a.clone();
            move |v: &u32| a.lock().push(*v)
        });
        let sub_b = p.subscribe({
            let b = b.clone();
            move |v: &u32| b.lock().push(*v)
        });

        p.start(true).unwrap();
        time::sleep(ms(1_500)).await;
        assert!(sub_b.unsubscribe());
        time::sleep(ms(2_000)).await;
        p.stop();

        assert_eq!(*a.lock(), vec![1, 2, 3, 4]);
        assert_eq!(*b.lock(), vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_are_not_delivered() {
        let reg = PollerRegistry::new();
        let p = build(&reg, "flaky", 1000, 10_000);
        p.set_action(|| async { Err::<u32, _>(ActionError::fail("offline")) });
        let got = Arc::new(AtomicU32::new(0));
        p.subscribe({
            let got = got.clone();
            move |_: &u32| {
                got.fetch_add(1, Ordering::SeqCst);
            }
        });

        p.start(true).unwrap();
        time::sleep(ms(3_500)).await;
        p.stop();

        assert_eq!(got.load(Ordering::SeqCst), 0);
        assert_eq!(p.error_count(), 2);
        assert!(!p.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_destroyed_poller_cannot_start() {
        let reg = PollerRegistry::new();
        let p = build(&reg, "gone", 1000, 10_000);
        counting(&p);
        p.start(true).unwrap();

        p.destroy();
        assert!(p.is_destroyed());
        assert!(!p.is_running());
        assert!(!reg.contains("gone"));
        assert!(matches!(p.start(true), Err(PollerError::Destroyed { .. })));
    }

    #[test]
    fn test_concurrent_start_and_destroy_never_leaves_poller_running() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        for i in 0..200 {
            let reg = PollerRegistry::new();
            let name = format!("race-{i}");
            let p = build(&reg, &name, 1000, 10_000);
            counting(&p);

            let barrier = Arc::new(std::sync::Barrier::new(2));
            let starter = {
                let p = p.clone();
                let barrier = barrier.clone();
                let handle = rt.handle().clone();
                std::thread::spawn(move || {
                    let _guard = handle.enter();
                    barrier.wait();
                    let _ = p.start(true);
                })
            };
            barrier.wait();
            p.destroy();
            starter.join().unwrap();

            assert!(p.is_destroyed());
            assert!(!p.is_running());
            assert!(!reg.contains(&name));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_last_handle_stops_polling() {
        let reg = PollerRegistry::new();
        let p = build(&reg, "dropped", 1000, 10_000);
        let n = counting(&p);
        p.start(true).unwrap();
        time::sleep(ms(10)).await;

        drop(p);
        time::sleep(ms(10_000)).await;

        assert_eq!(n.load(Ordering::SeqCst), 1);
        assert!(!reg.contains("dropped"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pollers_are_independent() {
        let reg = PollerRegistry::new();
        let a = build(&reg, "a", 1000, 10_000);
        let b = build(&reg, "b", 1000, 10_000);
        a.set_action(|| async { Err::<u32, _>(ActionError::fail("a is down")) });
        let nb = counting(&b);
        let got_b = Arc::new(Mutex::new(Vec::new()));
        b.subscribe({
            let got_b = got_b.clone();
            move |v: &u32| got_b.lock().push(*v)
        });

        a.start(true).unwrap();
        b.start(true).unwrap();
        time::sleep(ms(3_500)).await;
        a.stop();
        time::sleep(ms(1_000)).await;

        assert_eq!(a.error_count(), 2);
        assert_eq!(b.error_count(), 0);
        assert_eq!(nb.load(Ordering::SeqCst), 5);
        assert_eq!(*got_b.lock(), vec![1, 2, 3, 4, 5]);
        assert!(b.is_running());
        b.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookup_returns_same_poller() {
        let reg = PollerRegistry::new();
        let p = build(&reg, "shared", 1000, 10_000);
        let n = counting(&p);

        let found = reg.get_poller::<u32>("shared").unwrap();
        found.start(true).unwrap();
        time::sleep(ms(10)).await;

        assert!(p.is_running());
        assert_eq!(n.load(Ordering::SeqCst), 1);
        p.stop();
    }
}
