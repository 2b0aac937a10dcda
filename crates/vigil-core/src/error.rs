//! Shared error type for core data model validation.

use thiserror::Error;

/// Errors that can occur while constructing or validating core types.
#[derive(Debug, Error)]
pub enum VigilError {
    /// A field failed validation (e.g. `poll_interval_seconds < 5`).
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        /// The field that failed validation.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Result type for core crate operations.
pub type VigilResult<T> = Result<T, VigilError>;
