//! # Result subscribers.
//!
//! Successful results of a poller are delivered synchronously, in invocation order,
//! to every subscriber registered on it. Failures are never delivered here; observe
//! them through [`Poller::events`](crate::Poller::events) if needed.
//!
//! ## Architecture
//! ```text
//! PollEngine ── Ok(result) ──► SubscriberSet::emit(&result)
//!                                  ├──► closure subscriber
//!                                  ├──► impl Subscribe<T>
//!                                  └──► ...
//! ```

mod set;
mod subscribe;

pub(crate) use set::panic_message;
pub use set::{SubscriberSet, Subscription, SubscriptionId};
pub use subscribe::Subscribe;
