//! Prelude — commonly used types for convenient import.

pub use crate::{BusError, BusResult, DEFAULT_MAX_QUEUE, InMemoryBus, MessageBus, Subscription};
