//! Message bus error types.

use thiserror::Error;

/// Errors that can occur on the message bus.
#[derive(Debug, Error)]
pub enum BusError {
    /// `publish` or `subscribe` was called after `close()`.
    #[error("message bus is closed")]
    Closed,

    /// The distributed (Redis) bus could not reach its backend.
    #[error("distributed bus backend error: {0}")]
    Backend(String),
}

/// Result type for message bus operations.
pub type BusResult<T> = Result<T, BusError>;
