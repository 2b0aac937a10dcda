//! In-process lock manager: a `DashMap`-backed table of fencing tokens
//! with TTL expiry, matching the set-if-absent + compare-and-delete model
//! `RedisLockManager` uses against Redis.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry as MapEntry;
use rand::Rng;
use tracing::{debug, trace};

use crate::error::LockResult;
use crate::trait_def::{LockGuard, LockManager};

struct Lease {
    token: u128,
    expires_at: Instant,
}

/// In-process implementation of [`LockManager`].
///
/// Cheap to clone: every clone shares the same lease table, matching
/// `InMemoryBus`'s sharing model.
#[derive(Clone, Default)]
pub struct InProcessLockManager {
    table: Arc<DashMap<String, Lease>>,
}

impl InProcessLockManager {
    /// Construct an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn random_token() -> u128 {
    rand::thread_rng().r#gen()
}

#[async_trait]
impl LockManager for InProcessLockManager {
    async fn lock(&self, key: &str, ttl: Duration) -> LockResult<Option<Box<dyn LockGuard>>> {
        let now = Instant::now();
        let token = random_token();

        let acquired = match self.table.entry(key.to_string()) {
            MapEntry::Vacant(vacant) => {
                vacant.insert(Lease {
                    token,
                    expires_at: now + ttl,
                });
                true
            }
            MapEntry::Occupied(mut occupied) => {
                if occupied.get().expires_at <= now {
                    debug!(key, "superseding expired lease");
                    occupied.insert(Lease {
                        token,
                        expires_at: now + ttl,
                    });
                    true
                } else {
                    false
                }
            }
        };

        if !acquired {
            trace!(key, "lock not acquired; another holder owns it");
            return Ok(None);
        }

        Ok(Some(Box::new(InProcessLockGuard {
            table: Arc::clone(&self.table),
            key: key.to_string(),
            token,
        })))
    }
}

struct InProcessLockGuard {
    table: Arc<DashMap<String, Lease>>,
    key: String,
    token: u128,
}

impl LockGuard for InProcessLockGuard {}

impl Drop for InProcessLockGuard {
    fn drop(&mut self) {
        // Compare-and-delete: only remove if we still hold the fencing
        // token (a slow holder superseded past TTL must not have its
        // replacement's lease stolen by this release).
        self.table.remove_if(&self.key, |_, lease| lease.token == self.token);
    }
}
