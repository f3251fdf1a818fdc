//! Poller events: types, broadcast bus and log writer.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`, one per poller
//! - [`LogWriter`] drains a bus receiver into `tracing`
//!
//! ## Quick reference
//! - **Publisher**: the poll engine (`core::engine`) and the poller facade.
//! - **Consumers**: [`Poller::events`](crate::Poller::events) receivers.

mod bus;
mod event;
mod log;

pub use bus::{Bus, DEFAULT_BUS_CAPACITY};
pub use event::{BackoffSource, Event, EventKind};
pub use log::LogWriter;
