//! Vigil Lock — fencing-token mutual exclusion around the single booking
//! action per session.
//!
//! The default implementation is [`InProcessLockManager`]: a `DashMap`
//! lease table scoped to one process. Enabling the `redis` feature adds
//! [`RedisLockManager`], a `SET NX PX` + Lua-release distributed
//! alternative, wired up alongside the distributed bus whenever
//! `VIGIL_BUS`/`AGENTBOT_BUS=redis` is set — required once more than one
//! runtime instance can race for the same session's slot.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(unreachable_pub)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod memory;
#[cfg(feature = "redis")]
mod redis_lock;
mod trait_def;

pub use error::{LockError, LockResult};
pub use memory::InProcessLockManager;
pub use trait_def::{DEFAULT_TTL, LockGuard, LockManager};

#[cfg(feature = "redis")]
pub use redis_lock::RedisLockManager;
