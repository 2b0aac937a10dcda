//! Lock manager error types.

use thiserror::Error;

/// Errors that can occur acquiring or releasing a distributed lock.
///
/// Note: "lock not acquired" is *not* an error — a booking agent treats a
/// miss as "skip this availability envelope silently" — it is
/// represented as `Ok(None)` from [`crate::LockManager::lock`], not a
/// variant here.
#[derive(Debug, Error)]
pub enum LockError {
    /// The distributed (Redis) backend could not be reached.
    #[error("lock backend error: {0}")]
    Backend(String),
}

/// Result type for lock manager operations.
pub type LockResult<T> = Result<T, LockError>;
