//! # Result subscriber trait
//!
//! `Subscribe` is the extension point through which a host receives the successful
//! results of a poller. Any `Fn(&T) + Send + Sync` closure is a subscriber.
//!
//! ## Contract
//! - Called synchronously from the poller's engine task, once per successful result,
//!   in invocation order.
//! - Keep it short: the next invocation is not scheduled before all subscribers
//!   returned. Hand heavy work to a channel or a spawned task.
//! - A panic is caught and logged; it does not affect other subscribers or the poller.
//!
//! ## Example
//! ```rust
//! use pollvisor::Subscribe;
//!
//! struct Printer;
//!
//! impl Subscribe<String> for Printer {
//!     fn on_result(&self, result: &String) {
//!         println!("got {result}");
//!     }
//!     fn name(&self) -> &str { "printer" }
//! }
//! ```

/// Contract for result subscribers.
pub trait Subscribe<T>: Send + Sync + 'static {
    /// Handle one successful result.
    fn on_result(&self, result: &T);

    /// Human-readable name (for logs).
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

impl<T, F> Subscribe<T> for F
where
    F: Fn(&T) + Send + Sync + 'static,
{
    fn on_result(&self, result: &T) {
        self(result)
    }
}
