//! Audit log error types.

use thiserror::Error;

/// Errors that can occur while writing audit entries.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The log file could not be opened or appended to.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path the operation was attempted against.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The entry payload could not be serialized.
    #[error("failed to serialize audit entry: {0}")]
    Serialization(String),
}

/// Result type for audit log operations.
pub type AuditResult<T> = Result<T, AuditError>;
