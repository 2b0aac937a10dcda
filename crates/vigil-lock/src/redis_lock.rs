//! Redis-backed lock manager, an equivalent distributed substitute for
//! [`crate::InProcessLockManager`], wired up by the CLI alongside the
//! distributed bus when `VIGIL_BUS`/`AGENTBOT_BUS=redis` and `REDIS_URL`
//! are set. Grounded on `original_source/.../locks_redis.py`'s `_RedisLock`:
//! `SET key token NX PX ttl` to acquire, a compare-and-delete Lua script
//! to release.

use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;
use uuid::Uuid;

use crate::error::{LockError, LockResult};
use crate::trait_def::{LockGuard, LockManager};

/// `if redis.call('get', KEYS[1]) == ARGV[1] then return redis.call('del',
/// KEYS[1]) else return 0 end` — only the holder presenting the correct
/// fencing token may delete the key.
const RELEASE_SCRIPT: &str = r"
if redis.call('get', KEYS[1]) == ARGV[1] then
    return redis.call('del', KEYS[1])
else
    return 0
end
";

/// Distributed lock manager backed by Redis `SET NX PX`.
pub struct RedisLockManager {
    client: redis::Client,
}

impl RedisLockManager {
    /// Connect to `url` (e.g. `redis://localhost:6379/0`).
    pub fn new(url: &str) -> LockResult<Self> {
        let client = redis::Client::open(url).map_err(|e| LockError::Backend(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl LockManager for RedisLockManager {
    async fn lock(&self, key: &str, ttl: Duration) -> LockResult<Option<Box<dyn LockGuard>>> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| LockError::Backend(e.to_string()))?;

        let token = Uuid::new_v4().to_string();
        let ttl_ms: usize = ttl.as_millis().try_into().unwrap_or(usize::MAX);

        let acquired: bool = redis::cmd("SET")
            .arg(key)
            .arg(&token)
            .arg("NX")
            .arg("PX")
            .arg(ttl_ms)
            .query_async::<Option<String>>(&mut conn)
            .await
            .map_err(|e| LockError::Backend(e.to_string()))?
            .is_some();

        if !acquired {
            return Ok(None);
        }

        Ok(Some(Box::new(RedisLockGuard {
            client: self.client.clone(),
            key: key.to_string(),
            token,
        })))
    }
}

struct RedisLockGuard {
    client: redis::Client,
    key: String,
    token: String,
}

impl LockGuard for RedisLockGuard {}

impl Drop for RedisLockGuard {
    fn drop(&mut self) {
        // Drop can't be async; release fires as a detached task. A process
        // crash before this runs is covered by the lease's PX ttl.
        let client = self.client.clone();
        let key = std::mem::take(&mut self.key);
        let token = std::mem::take(&mut self.token);
        tokio::spawn(async move {
            let Ok(mut conn) = client.get_multiplexed_async_connection().await else {
                warn!(key, "failed to connect to release redis lock");
                return;
            };
            let result: redis::RedisResult<i64> = redis::Script::new(RELEASE_SCRIPT)
                .key(&key)
                .arg(&token)
                .invoke_async(&mut conn)
                .await;
            if let Err(e) = result {
                warn!(key, error = %e, "failed to release redis lock");
            }
        });
    }
}
