//! In-process message bus with bounded, oldest-drop subscriber queues.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;
use tracing::{debug, trace, warn};
use vigil_core::{EventEnvelope, EventType, SessionId};

use crate::error::{BusError, BusResult};
use crate::trait_def::{self, MessageBus, Subscription};

struct SubscriptionState {
    id: u64,
    event_type: EventType,
    session_filter: Option<SessionId>,
    max_queue: usize,
    queue: Mutex<VecDeque<EventEnvelope>>,
    notify: Notify,
}

impl SubscriptionState {
    fn matches(&self, envelope: &EventEnvelope) -> bool {
        envelope.event_type() == self.event_type
            && envelope.matches_session(self.session_filter.as_ref())
    }

    /// Enqueue `envelope`, dropping the oldest buffered entry if the
    /// subscriber's queue is already at `max_queue` (freshness over
    /// history, never blocks the publisher).
    fn enqueue(&self, envelope: EventEnvelope) {
        let mut queue = match self.queue.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if queue.len() >= self.max_queue {
            let dropped = queue.pop_front();
            if let Some(dropped) = dropped {
                trace!(
                    subscription = self.id,
                    dropped_id = %dropped.id,
                    "dropping oldest envelope under backpressure"
                );
            }
        }
        queue.push_back(envelope);
        drop(queue);
        self.notify.notify_one();
    }
}

/// Handle returned by [`InMemoryBus::subscribe`].
pub struct MemorySubscription {
    state: Arc<SubscriptionState>,
    bus: Arc<Inner>,
}

#[async_trait]
impl Subscription for MemorySubscription {
    async fn recv(&mut self) -> Option<EventEnvelope> {
        loop {
            let notified = self.state.notify.notified();
            tokio::pin!(notified);

            {
                let mut queue = match self.state.queue.lock() {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
                if let Some(envelope) = queue.pop_front() {
                    return Some(envelope);
                }
            }

            notified.await;
        }
    }
}

impl Drop for MemorySubscription {
    fn drop(&mut self) {
        self.bus.unsubscribe(self.state.event_type, self.state.id);
    }
}

struct Inner {
    topics: Mutex<HashMap<EventType, Vec<Arc<SubscriptionState>>>>,
    closed: AtomicBool,
    next_id: AtomicU64,
}

impl Inner {
    fn unsubscribe(&self, event_type: EventType, id: u64) {
        let mut topics = match self.topics.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(subs) = topics.get_mut(&event_type) {
            subs.retain(|s| s.id != id);
        }
    }
}

/// In-process implementation of [`MessageBus`].
///
/// Cheap to clone: every clone shares the same subscriber table.
#[derive(Clone)]
pub struct InMemoryBus {
    inner: Arc<Inner>,
}

impl InMemoryBus {
    /// Construct a fresh, open bus.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                topics: Mutex::new(HashMap::new()),
                closed: AtomicBool::new(false),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Current number of active subscriptions across every topic, for
    /// diagnostics and tests.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        let topics = match self.inner.topics.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        topics.values().map(Vec::len).sum()
    }
}

impl Default for InMemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageBus for InMemoryBus {
    async fn publish(&self, envelope: EventEnvelope) -> BusResult<()> {
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(BusError::Closed);
        }

        let subscribers = {
            let topics = match self.inner.topics.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            topics
                .get(&envelope.event_type())
                .cloned()
                .unwrap_or_default()
        };

        let mut delivered = 0usize;
        for sub in &subscribers {
            if sub.matches(&envelope) {
                sub.enqueue(envelope.clone());
                delivered += 1;
            }
        }
        trace!(event_type = ?envelope.event_type(), delivered, "published envelope");
        Ok(())
    }

    async fn subscribe(
        &self,
        event_type: EventType,
        session_filter: Option<SessionId>,
        max_queue: usize,
    ) -> BusResult<Box<dyn Subscription>> {
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(BusError::Closed);
        }
        let max_queue = if max_queue == 0 {
            trait_def::DEFAULT_MAX_QUEUE
        } else {
            max_queue
        };
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        let state = Arc::new(SubscriptionState {
            id,
            event_type,
            session_filter,
            max_queue,
            queue: Mutex::new(VecDeque::with_capacity(max_queue)),
            notify: Notify::new(),
        });

        {
            let mut topics = match self.inner.topics.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            topics
                .entry(event_type)
                .or_insert_with(Vec::new)
                .push(Arc::clone(&state));
        }

        debug!(?event_type, subscription = id, max_queue, "new subscription");
        Ok(Box::new(MemorySubscription {
            state,
            bus: Arc::clone(&self.inner),
        }))
    }

    async fn close(&self) -> BusResult<()> {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let all_subscriptions: Vec<Arc<SubscriptionState>> = {
            let mut topics = match self.inner.topics.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let drained = std::mem::take(&mut *topics);
            drained.into_values().flatten().collect()
        };
        warn!(
            subscriptions = all_subscriptions.len(),
            "closing message bus"
        );
        for sub in all_subscriptions {
            sub.enqueue(EventEnvelope::bus_closed_sentinel());
        }
        Ok(())
    }
}
