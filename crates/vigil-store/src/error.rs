//! Session store error types.

use thiserror::Error;

/// Errors from session store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store file could not be read or written.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path the operation was attempted against.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configured encryption key was rejected.
    #[error("session store encryption key error: {0}")]
    Key(#[from] vigil_crypto::CryptoError),

    /// A record in the store file did not match the expected shape.
    ///
    /// Names the offending record so a failed load points at exactly
    /// which entry was bad.
    #[error("invalid session record at index {index}: {reason}")]
    InvalidRecord {
        /// Zero-based position of the bad record in the stored array.
        index: usize,
        /// What went wrong parsing it.
        reason: String,
    },

    /// The on-disk payload was not valid JSON (after decryption, if any).
    #[error("malformed session store file: {0}")]
    Malformed(String),

    /// No session exists with the given id.
    #[error("session not found: {0}")]
    NotFound(String),
}

/// Result type for session store operations.
pub type StoreResult<T> = Result<T, StoreError>;
