//! Vigil Bus — topic+session-filtered pub/sub with per-subscriber
//! backpressure.
//!
//! The default, always-available implementation is [`InMemoryBus`]: an
//! in-process bus with bounded, oldest-drop subscriber queues. Enabling
//! the `redis` feature adds [`RedisBus`], a Redis-Streams-backed
//! distributed alternative selected at runtime via `VIGIL_BUS=redis`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(unreachable_pub)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod memory;
#[cfg(feature = "redis")]
mod redis_bus;
mod trait_def;

pub use error::{BusError, BusResult};
pub use memory::{InMemoryBus, MemorySubscription};
pub use trait_def::{DEFAULT_MAX_QUEUE, MessageBus, Subscription};

#[cfg(feature = "redis")]
pub use redis_bus::{RedisBus, RedisSubscription};
