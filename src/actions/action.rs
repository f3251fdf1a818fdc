//! # Action abstraction.
//!
//! An [`Action`] is the unit of work a poller repeats: typically a network request
//! whose response is handed to subscribers. The engine knows nothing else about it.
//!
//! Each invocation runs on its own tokio task, so a poller that is stopped while an
//! invocation is in flight lets that invocation finish in the background and simply
//! ignores its outcome.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ActionError;

/// Shared handle to an action.
pub type ActionRef<T> = Arc<dyn Action<T>>;

/// # Asynchronous operation polled by a [`Poller`](crate::Poller).
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use pollvisor::{Action, ActionError};
///
/// struct Clock;
///
/// #[async_trait]
/// impl Action<u64> for Clock {
///     async fn run(&self) -> Result<u64, ActionError> {
///         Ok(42)
///     }
/// }
/// ```
#[async_trait]
pub trait Action<T>: Send + Sync + 'static {
    /// Performs one invocation.
    async fn run(&self) -> Result<T, ActionError>;
}
