//! Runtime core: scheduling and lifecycle.
//!
//! The public API from this module is [`Poller`] (with its [`PollerBuilder`]),
//! [`PollerRegistry`] and the read-only [`PollStatus`] snapshot.
//!
//! Internal modules:
//! - [`state`]: error counter, phase and last delay of one poller;
//! - [`engine`]: the state machine that invokes the action, applies backoff and
//!   delivers results;
//! - [`registry`]: process-wide name directory;
//! - [`poller`]: the facade binding name, config, action and engine.

mod engine;
mod poller;
mod registry;
mod state;

pub use poller::{Poller, PollerBuilder};
pub use registry::PollerRegistry;
pub use state::{PollPhase, PollStatus};
