//! Prelude — commonly used types for convenient import.

pub use crate::{
    AgentError, AgentResult, AvailabilityProvider, BookingAgent, BookingProvider, MonitorAgent,
    NullAvailabilityProvider, NullBookingProvider,
};
