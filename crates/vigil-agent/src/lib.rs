//! Vigil Agent — long-running monitor/booking workers.
//!
//! [`lifecycle::AgentLifecycle`] is the shared start/stop scaffolding every
//! worker embeds. [`monitor::MonitorAgent`] polls an [`providers::AvailabilityProvider`]
//! and publishes availability; [`booking::BookingAgent`] consumes those
//! events under a [`vigil_lock::LockManager`] lease and invokes a
//! [`providers::BookingProvider`]. Neither agent type references the other —
//! they only share the bus, the planner, and (for the booker) the lock
//! manager and audit log.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(unreachable_pub)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod booking;
mod error;
mod lifecycle;
mod monitor;
mod providers;

pub use booking::BookingAgent;
pub use error::{AgentError, AgentResult};
pub use lifecycle::AgentLifecycle;
pub use monitor::{MONITOR_EVENT_TYPE, MonitorAgent};
pub use providers::{
    AvailabilityProvider, BookingProvider, NullAvailabilityProvider, NullBookingProvider,
};
