//! Prelude — commonly used types for convenient import.
//!
//! Use `use vigil_core::prelude::*;` to import all essential types.

pub use crate::{
    AgentConfig, AppointmentAvailability, AppointmentBookingRequest, BookingResultPayload,
    EventEnvelope, EventType, HeartbeatPayload, Payload, RuntimeAlertPayload, SessionId,
    SessionRecord, VigilError, VigilResult,
};
