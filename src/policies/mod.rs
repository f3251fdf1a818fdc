//! Backoff and jitter policies.
//!
//! This module groups the knobs that decide **how long** a poller waits between
//! invocations.
//!
//! ## Contents
//! - [`next_delay`]    the pure backoff rule `min(interval × 2^errors, max)`
//! - [`BackoffPolicy`] interval / max / jitter bundle taken from a [`PollerConfig`](crate::PollerConfig)
//! - [`JitterPolicy`]  randomization strategy to avoid synchronized pollers
//!
//! ## Quick wiring
//! ```text
//! PollerConfig { interval, max_interval, jitter }
//!      └─► core::engine reads a snapshot per decision
//!           └─► BackoffPolicy::next(error_count) schedules the next invocation
//! ```

mod backoff;
mod jitter;

pub use backoff::{BackoffPolicy, next_delay};
pub use jitter::JitterPolicy;
