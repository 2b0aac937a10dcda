//! The `LockManager` contract.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::LockResult;

/// Default TTL when a caller doesn't specify one explicitly, matching the
/// booking agent's usual 30s default.
pub const DEFAULT_TTL: Duration = Duration::from_millis(30_000);

/// A held, fencing-token-protected lease.
///
/// Purely an RAII marker: dropping it releases the lease if (and only if)
/// it is still owned by this holder (compare-and-delete against the
/// fencing token). Concrete implementations attach their own [`Drop`].
pub trait LockGuard: Send {}

/// Distributed, token-fenced mutual exclusion.
///
/// `lock` either returns `Some(guard)` (exclusive lease acquired) or
/// `None` (another holder owns the key right now) — a miss is not an
/// error.
#[async_trait]
pub trait LockManager: Send + Sync {
    /// Attempt to acquire `key` for `ttl`. A crashed or superseded holder
    /// cannot block this call past `ttl`.
    async fn lock(&self, key: &str, ttl: Duration) -> LockResult<Option<Box<dyn LockGuard>>>;
}
