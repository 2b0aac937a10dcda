//! Booking agent: consumes `AppointmentAvailable` envelopes for its own
//! session and races, under a lock, to reserve the slot.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use vigil_audit::AuditLog;
use vigil_bus::MessageBus;
use vigil_core::{
    AgentConfig, AppointmentBookingRequest, BookingResultPayload, EventEnvelope, EventType,
    Payload, SessionRecord,
};
use vigil_lock::{DEFAULT_TTL, LockManager};
use vigil_planner::AgentPlanner;

use crate::error::AgentResult;
use crate::lifecycle::{self, AgentLifecycle};
use crate::providers::BookingProvider;

/// Consumes availability events for one session and attempts a booking
/// under the `book:{session_id}` lease.
pub struct BookingAgent {
    config: AgentConfig,
    session: SessionRecord,
    bus: Arc<dyn MessageBus>,
    provider: Arc<dyn BookingProvider>,
    locks: Option<Arc<dyn LockManager>>,
    planner: Option<AgentPlanner>,
    audit: Option<AuditLog>,
    lock_ttl: Duration,
    lifecycle: AgentLifecycle,
}

impl BookingAgent {
    /// Construct a booker for `session`. `locks` and `audit` are optional:
    /// without a lock manager every envelope is attempted unconditionally;
    /// without an audit log, results are still published but not recorded.
    #[must_use]
    pub fn new(
        config: AgentConfig,
        session: SessionRecord,
        bus: Arc<dyn MessageBus>,
        provider: Arc<dyn BookingProvider>,
        locks: Option<Arc<dyn LockManager>>,
        planner: Option<AgentPlanner>,
        audit: Option<AuditLog>,
    ) -> Self {
        let name = format!("booker-{}", config.session_id);
        Self {
            config,
            session,
            bus,
            provider,
            locks,
            planner,
            audit,
            lock_ttl: DEFAULT_TTL,
            lifecycle: AgentLifecycle::new(name),
        }
    }

    /// Override the lock TTL (defaults to [`DEFAULT_TTL`], the booking
    /// agent's usual 30s lease).
    #[must_use]
    pub fn with_lock_ttl(mut self, ttl: Duration) -> Self {
        self.lock_ttl = ttl;
        self
    }

    /// Start consuming availability envelopes. Calling this again while
    /// already running is a no-op.
    pub async fn start(self: &Arc<Self>) {
        let this = Arc::clone(self);
        self.lifecycle
            .start_with(move |token| async move { this.run_wrapper(token).await })
            .await;
    }

    /// Cooperatively cancel and wait for the in-flight envelope, if any,
    /// to finish.
    pub async fn stop(&self) {
        self.lifecycle.stop().await;
    }

    /// True once `stop()` has been called.
    #[must_use]
    pub fn should_stop(&self) -> bool {
        self.lifecycle.should_stop()
    }

    async fn run_wrapper(&self, token: CancellationToken) {
        if let Err(e) = lifecycle::catch_panics(self.run(&token)).await {
            error!(session_id = %self.config.session_id, error = %e, "booking agent exited abnormally");
        }
        info!(session_id = %self.config.session_id, "booking agent stopped");
    }

    async fn run(&self, token: &CancellationToken) -> AgentResult<()> {
        let mut subscription = self
            .bus
            .subscribe(
                EventType::AppointmentAvailable,
                Some(self.config.session_id.clone()),
                vigil_bus::DEFAULT_MAX_QUEUE,
            )
            .await
            .map_err(|e| crate::error::AgentError::Provider(format!("subscribe failed: {e}")))?;

        loop {
            let envelope = tokio::select! {
                () = token.cancelled() => break,
                envelope = subscription.recv() => envelope,
            };

            let Some(envelope) = envelope else {
                info!(session_id = %self.config.session_id, "booking subscription ended");
                break;
            };

            if envelope.is_bus_closed() {
                info!(session_id = %self.config.session_id, "bus closed; booking agent exiting");
                break;
            }

            if token.is_cancelled() {
                break;
            }

            let Payload::AppointmentAvailable(slot) = envelope.payload else {
                continue;
            };

            self.attempt_booking(slot).await;
        }

        Ok(())
    }

    async fn attempt_booking(&self, slot: vigil_core::AppointmentAvailability) {
        if let Some(planner) = &self.planner {
            planner.on_booking_attempt(&self.config.session_id);
        }

        info!(
            session_id = %self.config.session_id,
            slot_id = %slot.slot_id,
            "received availability slot; attempting booking"
        );

        let request = AppointmentBookingRequest {
            session_id: self.config.session_id.clone(),
            slot: slot.clone(),
            user_profile: self.session.profile.clone(),
            preferences: self.session.preferences.clone(),
        };

        let lock_key = format!("book:{}", self.config.session_id);
        let guard = match &self.locks {
            Some(locks) => match locks.lock(&lock_key, self.lock_ttl).await {
                Ok(Some(guard)) => Some(guard),
                Ok(None) => {
                    info!(session_id = %self.config.session_id, "another worker holds booking lock; skipping");
                    return;
                }
                Err(e) => {
                    warn!(session_id = %self.config.session_id, error = %e, "lock backend error; skipping");
                    return;
                }
            },
            None => None,
        };

        let result = match self.provider.book(&request, &self.session).await {
            Ok(result) => result,
            Err(e) => {
                warn!(session_id = %self.config.session_id, error = %e, "booking provider error");
                BookingResultPayload {
                    session_id: self.config.session_id.clone(),
                    success: false,
                    confirmation_number: None,
                    message: Some(e.to_string()),
                    slot: Some(slot),
                    raw_response: None,
                }
            }
        };

        // The lock must not be held across the publish or audit write.
        drop(guard);

        if let Some(planner) = &self.planner {
            planner.on_booking_result(&self.config.session_id, result.clone());
        }

        if result.success {
            info!(session_id = %self.config.session_id, slot_id = %result.slot.as_ref().map(|s| s.slot_id.as_str()).unwrap_or_default(), "successfully booked slot");
        } else {
            warn!(session_id = %self.config.session_id, message = ?result.message, "booking failed");
        }

        let envelope = EventEnvelope::new(
            self.config.session_id.clone(),
            Payload::BookingResult(result.clone()),
        );
        if let Err(e) = self.bus.publish(envelope).await {
            warn!(session_id = %self.config.session_id, error = %e, "failed to publish booking result");
        }

        if let Some(audit) = &self.audit {
            let payload = serde_json::to_value(&result).unwrap_or(serde_json::Value::Null);
            if let Err(e) = audit
                .log("booking_result", self.config.session_id.clone(), payload)
                .await
            {
                warn!(session_id = %self.config.session_id, error = %e, "failed to write audit entry");
            }
        }
    }
}
