//! Prelude — commonly used types for convenient import.

pub use crate::{DEFAULT_TTL, InProcessLockManager, LockError, LockGuard, LockManager, LockResult};
