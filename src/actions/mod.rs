//! # Action abstractions.
//!
//! This module provides the types a host uses to plug work into a poller:
//! - [`Action`] - trait for an async operation producing a result or a failure
//! - [`ActionFn`] - closure-backed action implementation
//! - [`ActionRef`] - shared reference to an action (`Arc<dyn Action<T>>`)

mod action;
mod action_fn;

pub use action::{Action, ActionRef};
pub use action_fn::ActionFn;
