//! # pollvisor
//!
//! **Pollvisor** runs named, restartable async pollers. A poller repeatedly invokes a
//! caller-supplied action, hands every successful result to its subscribers, and
//! backs off exponentially while the action fails, returning to its normal interval
//! on the next success.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   Poller::create("feed")  ───────────────► PollerRegistry (name → Weak<Poller>)
//!        │
//!        ├─ set_action(fn)      ┐
//!        ├─ set_config(update)  ├─► PollEngine
//!        ├─ subscribe(callback) ┘     ├─ PollerConfig   (interval, max_interval, jitter)
//!        │                            ├─ PollState      (error_count, phase, last delay)
//!        └─ start / stop / destroy    ├─ Connection     (CancellationToken + task)
//!                                     ├─ SubscriberSet  (results, in invocation order)
//!                                     └─ Bus            (lifecycle events → LogWriter, ...)
//! ```
//!
//! ### Lifecycle
//! ```text
//! start(force) ──► sleep(force ? 0 : interval)
//!
//! loop {
//!   ├─► invoke current action (own task)
//!   │       ├─ Ok  ──► error_count = 0  ──► deliver to subscribers
//!   │       └─ Err ──► error_count += 1 (never delivered)
//!   ├─► delay = min(interval × 2^error_count, max_interval)
//!   └─► sleep(delay)
//! }
//!
//! stop()    ──► cancel connection: no further invocation, delivery or state change;
//!               an in-flight action finishes detached and is ignored
//! destroy() ──► stop() + release the name
//! ```
//!
//! ## Features
//! | Area              | Description                                                | Key types / traits                        |
//! |-------------------|------------------------------------------------------------|-------------------------------------------|
//! | **Pollers**       | Named instances with start/stop/destroy.                   | [`Poller`], [`PollerBuilder`]             |
//! | **Registry**      | Unique names, lookup by name.                              | [`PollerRegistry`]                        |
//! | **Policies**      | Exponential backoff with cap, optional jitter.             | [`next_delay`], [`BackoffPolicy`], [`JitterPolicy`] |
//! | **Configuration** | Mergeable partial config, JSON-friendly.                   | [`PollerConfig`], [`ConfigUpdate`]        |
//! | **Actions**       | Async work to poll.                                        | [`Action`], [`ActionFn`], [`ActionRef`]   |
//! | **Subscribers**   | Ordered delivery of successful results.                    | [`Subscribe`], [`Subscription`]           |
//! | **Events**        | Lifecycle events and a `tracing` writer.                   | [`Event`], [`EventKind`], [`LogWriter`]   |
//! | **Errors**        | Typed errors for API misuse and action failures.           | [`PollerError`], [`ActionError`]          |
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use pollvisor::{ActionError, ConfigUpdate, LogWriter, Poller, PollerRegistry};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = PollerRegistry::new();
//!     let poller: Poller<String> = Poller::builder("status")
//!         .registry(registry.clone())
//!         .config(ConfigUpdate::new().interval(Duration::from_millis(20)))
//!         .build()?;
//!
//!     LogWriter::new().spawn(poller.events());
//!     poller.set_action(|| async { Ok::<_, ActionError>("green".to_string()) });
//!     poller.subscribe(|status: &String| println!("status: {status}"));
//!     poller.start(true)?;
//!
//!     tokio::time::sleep(Duration::from_millis(50)).await;
//!     assert!(registry.get_poller::<String>("status").is_some());
//!
//!     poller.destroy();
//!     assert!(registry.get_poller::<String>("status").is_none());
//!     Ok(())
//! }
//! ```
mod actions;
mod config;
mod core;
mod error;
mod events;
mod policies;
mod subscribers;

// ---- Public re-exports ----

pub use actions::{Action, ActionFn, ActionRef};
pub use config::{ConfigUpdate, DEFAULT_INTERVAL, DEFAULT_MAX_INTERVAL, PollerConfig};
pub use core::{PollPhase, PollStatus, Poller, PollerBuilder, PollerRegistry};
pub use error::{ActionError, PollerError};
pub use events::{BackoffSource, Bus, DEFAULT_BUS_CAPACITY, Event, EventKind, LogWriter};
pub use policies::{BackoffPolicy, JitterPolicy, next_delay};
pub use subscribers::{Subscribe, SubscriberSet, Subscription, SubscriptionId};
