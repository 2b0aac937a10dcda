//! Prelude — commonly used types for convenient import.

pub use crate::{RuntimeError, RuntimeOrchestrator, RuntimeResult, Worker};
