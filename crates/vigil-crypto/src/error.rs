//! Cryptographic error types.

use thiserror::Error;

/// Errors that can occur during cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The configured key was not valid base64, or decoded to the wrong
    /// length for AES-256-GCM (32 bytes).
    #[error("invalid session key: {0}")]
    InvalidKey(String),

    /// Authenticated decryption failed — either the key is wrong, or the
    /// ciphertext was truncated or tampered with.
    ///
    /// Callers MUST treat this as fatal rather than falling back to any
    /// cached or default value — fail loudly.
    #[error("failed to decrypt: wrong key or corrupted ciphertext")]
    DecryptionFailed,

    /// Encryption failed. AES-GCM encryption is infallible for well-formed
    /// inputs; this only occurs for pathologically large plaintexts.
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),
}

/// Result type for cryptographic operations.
pub type CryptoResult<T> = Result<T, CryptoError>;
