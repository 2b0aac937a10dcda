//! Redis Streams-backed distributed bus, selected via `AGENTBOT_BUS=redis`
//! / `VIGIL_BUS=redis`. One stream, one consumer group per event type,
//! durable cursor via the consumer group, ack-after-dispatch.

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::{debug, warn};
use vigil_core::{EventEnvelope, EventType, SessionId};

use crate::error::{BusError, BusResult};
use crate::trait_def::{MessageBus, Subscription};

const STREAM_KEY: &str = "vigil.events";

/// Distributed message bus backed by a Redis stream with consumer groups.
///
/// Each entry is acknowledged immediately after successful dispatch to the
/// caller's in-process bounded channel: a crash between ack and the caller
/// actually processing the envelope can drop it. This bus is at-least-once
/// at best, never exactly-once.
pub struct RedisBus {
    client: redis::Client,
    closed: std::sync::atomic::AtomicBool,
}

impl RedisBus {
    /// Connect to `url` (e.g. `redis://localhost:6379/0`, from `REDIS_URL`).
    pub fn new(url: &str) -> BusResult<Self> {
        let client = redis::Client::open(url).map_err(|e| BusError::Backend(e.to_string()))?;
        Ok(Self {
            client,
            closed: std::sync::atomic::AtomicBool::new(false),
        })
    }

    async fn connection(&self) -> BusResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| BusError::Backend(e.to_string()))
    }
}

/// Subscription handle for [`RedisBus`].
pub struct RedisSubscription {
    conn: redis::aio::MultiplexedConnection,
    group: String,
    consumer: String,
    event_type: EventType,
    session_filter: Option<SessionId>,
}

#[async_trait]
impl Subscription for RedisSubscription {
    async fn recv(&mut self) -> Option<EventEnvelope> {
        loop {
            let opts = redis::streams::StreamReadOptions::default()
                .group(&self.group, &self.consumer)
                .count(10)
                .block(5000);

            let reply: redis::RedisResult<redis::streams::StreamReadReply> = self
                .conn
                .xread_options(&[STREAM_KEY], &[">"], &opts)
                .await;

            let reply = match reply {
                Ok(r) => r,
                Err(e) => {
                    warn!(error = %e, "redis bus read failed");
                    return None;
                }
            };

            for key in reply.keys {
                for id in key.ids {
                    let raw: Option<String> = id.map.get("event").and_then(|v| match v {
                        redis::Value::BulkString(bytes) => {
                            String::from_utf8(bytes.clone()).ok()
                        }
                        redis::Value::SimpleString(s) => Some(s.clone()),
                        _ => None,
                    });

                    let _: redis::RedisResult<i64> =
                        self.conn.xack(STREAM_KEY, &self.group, &[&id.id]).await;

                    let Some(raw) = raw else { continue };
                    let envelope: EventEnvelope = match serde_json::from_str(&raw) {
                        Ok(e) => e,
                        Err(e) => {
                            warn!(error = %e, "skipping unparsable redis bus entry");
                            continue;
                        }
                    };

                    if envelope.event_type() != self.event_type {
                        continue;
                    }
                    if !envelope.matches_session(self.session_filter.as_ref()) {
                        continue;
                    }
                    return Some(envelope);
                }
            }
        }
    }
}

#[async_trait]
impl MessageBus for RedisBus {
    async fn publish(&self, envelope: EventEnvelope) -> BusResult<()> {
        if self.closed.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(BusError::Closed);
        }
        let mut conn = self.connection().await?;
        let payload = serde_json::to_string(&envelope).map_err(|e| BusError::Backend(e.to_string()))?;
        let _: String = conn
            .xadd(STREAM_KEY, "*", &[("event", payload)])
            .await
            .map_err(|e| BusError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn subscribe(
        &self,
        event_type: EventType,
        session_filter: Option<SessionId>,
        _max_queue: usize,
    ) -> BusResult<Box<dyn Subscription>> {
        if self.closed.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(BusError::Closed);
        }
        let mut conn = self.connection().await?;
        let group = format!("g:{event_type:?}");
        let consumer = format!("c:{:?}:{}", session_filter, uuid::Uuid::new_v4());

        let created: redis::RedisResult<()> = conn
            .xgroup_create_mkstream(STREAM_KEY, &group, "$")
            .await;
        if let Err(e) = created {
            debug!(error = %e, "consumer group already exists or stream created");
        }

        Ok(Box::new(RedisSubscription {
            conn,
            group,
            consumer,
            event_type,
            session_filter,
        }))
    }

    async fn close(&self) -> BusResult<()> {
        self.closed.store(true, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }
}
