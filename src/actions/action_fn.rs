//! # Function-backed action (`ActionFn`)
//!
//! [`ActionFn`] wraps a closure `F: Fn() -> Fut`, producing a fresh future per
//! invocation. No state is shared between invocations unless the closure captures
//! an `Arc<...>` explicitly.
//!
//! ## Example
//! ```rust
//! use pollvisor::{ActionError, ActionFn, ActionRef};
//!
//! let a: ActionRef<String> = ActionFn::arc(|| async {
//!     Ok::<_, ActionError>("pong".to_string())
//! });
//! # let _ = a;
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::actions::action::Action;
use crate::error::ActionError;

/// Closure-backed action implementation.
pub struct ActionFn<F> {
    f: F,
}

impl<F> ActionFn<F> {
    /// Wraps `f`.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Wraps `f` and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut, T> Action<T> for ActionFn<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, ActionError>> + Send + 'static,
    T: Send + 'static,
{
    async fn run(&self) -> Result<T, ActionError> {
        (self.f)().await
    }
}
