//! The `MessageBus` contract, implemented by both the in-process bus and
//! (behind the `redis` feature) a distributed-log-backed bus — an
//! equivalent distributed bus may be substituted as long as it keeps the
//! same topic+filter semantics.

use async_trait::async_trait;
use vigil_core::{EventEnvelope, EventType, SessionId};

use crate::error::BusResult;

/// Default bound on a subscription's queue.
pub const DEFAULT_MAX_QUEUE: usize = 10;

/// A single subscriber's inbound stream of matching envelopes.
///
/// Each concrete bus implementation returns its own `Subscription`; callers
/// interact with it only through this trait.
#[async_trait]
pub trait Subscription: Send {
    /// Await the next matching envelope, or `None` once the stream has
    /// permanently ended (only happens if the underlying bus is dropped
    /// without calling `close()` — normal shutdown always yields the
    /// bus-closed sentinel instead).
    async fn recv(&mut self) -> Option<EventEnvelope>;
}

/// Topic+session-filtered publish/subscribe bus with per-subscriber
/// backpressure.
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Dispatch `envelope` to every subscription whose type and session
    /// filter match. Non-blocking per subscriber: a full queue drops its
    /// oldest entry rather than stalling the publisher.
    async fn publish(&self, envelope: EventEnvelope) -> BusResult<()>;

    /// Subscribe to `event_type`, optionally filtered to a single session.
    /// `max_queue` bounds how many undelivered envelopes this subscription
    /// buffers before the oldest-drop policy kicks in.
    async fn subscribe(
        &self,
        event_type: EventType,
        session_filter: Option<SessionId>,
        max_queue: usize,
    ) -> BusResult<Box<dyn Subscription>>;

    /// Stop accepting new publishes and deliver the bus-closed sentinel to
    /// every existing subscription.
    async fn close(&self) -> BusResult<()>;
}
