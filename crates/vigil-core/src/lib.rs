//! Vigil Core — shared event and domain types for the booking-race runtime.
//!
//! This crate provides:
//! - The session and agent-configuration data model
//! - The typed event envelope carried on the message bus
//! - Error scaffolding shared by every other `vigil-*` crate
//!
//! # Example
//!
//! ```
//! use vigil_core::{EventEnvelope, EventType, Payload, HeartbeatPayload};
//!
//! let envelope = EventEnvelope::new(
//!     "s-1",
//!     Payload::Heartbeat(HeartbeatPayload {
//!         agent: "monitor".to_string(),
//!         status: "ok".to_string(),
//!         timestamp: chrono::Utc::now(),
//!     }),
//! );
//! assert_eq!(envelope.event_type(), EventType::Heartbeat);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod prelude;

mod error;
mod event;
mod session;

pub use error::{VigilError, VigilResult};
pub use event::{
    AppointmentAvailability, AppointmentBookingRequest, BookingResultPayload, EventEnvelope,
    EventType, HeartbeatPayload, Payload, RuntimeAlertPayload,
};
pub use session::{AgentConfig, SessionId, SessionRecord};
