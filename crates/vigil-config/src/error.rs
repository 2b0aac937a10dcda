//! Configuration error types.

use thiserror::Error;

/// Errors raised while loading or validating runtime configuration.
///
/// Every variant is a startup-time failure: the process is expected to
/// fail fast with a nonzero exit code and never enter the run loop.
/// None of these are expected to occur once `load` has returned `Ok`.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file at {path}: {source}")]
    Io {
        /// Path that was attempted.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config file was not valid YAML, or did not match the expected
    /// shape.
    #[error("failed to parse config file at {path}: {source}")]
    Parse {
        /// Path that was attempted.
        path: String,
        /// Underlying parse error.
        #[source]
        source: serde_yaml::Error,
    },

    /// A recognized field failed validation.
    #[error("invalid config: {0}")]
    Invalid(String),

    /// `VIGIL_SESSION_KEY`/`AGENTBOT_SESSION_KEY` was set but was not a
    /// valid base64-encoded 32-byte key.
    #[error("invalid session encryption key: {0}")]
    InvalidSessionKey(#[from] vigil_crypto::CryptoError),

    /// `VIGIL_BUS`/`AGENTBOT_BUS` was set to `redis` but `REDIS_URL` was
    /// not provided.
    #[error("VIGIL_BUS=redis requires REDIS_URL to be set")]
    MissingRedisUrl,
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
