//! Monitor agent: polls an [`AvailabilityProvider`] and publishes
//! `AppointmentAvailable`/`Heartbeat` envelopes.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use vigil_bus::MessageBus;
use vigil_core::{AgentConfig, EventEnvelope, EventType, HeartbeatPayload, Payload, SessionRecord};
use vigil_planner::AgentPlanner;

use crate::error::{AgentError, AgentResult};
use crate::lifecycle::{self, AgentLifecycle};
use crate::providers::AvailabilityProvider;

/// Polls a provider for appointment availability on behalf of one
/// session, for the lifetime of the session.
pub struct MonitorAgent {
    config: AgentConfig,
    session: SessionRecord,
    bus: Arc<dyn MessageBus>,
    provider: Arc<dyn AvailabilityProvider>,
    planner: Option<AgentPlanner>,
    lifecycle: AgentLifecycle,
}

impl MonitorAgent {
    /// Construct a monitor for `session`, bound to `bus` and `provider`.
    /// `planner`, if supplied, is notified of state transitions.
    #[must_use]
    pub fn new(
        config: AgentConfig,
        session: SessionRecord,
        bus: Arc<dyn MessageBus>,
        provider: Arc<dyn AvailabilityProvider>,
        planner: Option<AgentPlanner>,
    ) -> Self {
        let name = format!("monitor-{}", config.session_id);
        Self {
            config,
            session,
            bus,
            provider,
            planner,
            lifecycle: AgentLifecycle::new(name),
        }
    }

    /// Start the poll loop. Calling this again while already running is
    /// a no-op.
    pub async fn start(self: &Arc<Self>) {
        let this = Arc::clone(self);
        self.lifecycle
            .start_with(move |token| async move { this.run_wrapper(token).await })
            .await;
    }

    /// Cooperatively cancel and wait for the poll loop to drain.
    pub async fn stop(&self) {
        self.lifecycle.stop().await;
    }

    /// True once `stop()` has been called.
    #[must_use]
    pub fn should_stop(&self) -> bool {
        self.lifecycle.should_stop()
    }

    async fn run_wrapper(&self, token: CancellationToken) {
        if let Some(planner) = &self.planner {
            planner.on_monitoring(&self.config.session_id);
        }
        if let Err(e) = lifecycle::catch_panics(self.run(&token)).await {
            error!(session_id = %self.config.session_id, error = %e, "monitor agent exited abnormally");
        }
        info!(session_id = %self.config.session_id, "monitor agent stopped");
    }

    async fn run(&self, token: &CancellationToken) -> AgentResult<()> {
        self.provider
            .ensure_login(&self.session)
            .await
            .map_err(|e| AgentError::Provider(format!("ensure_login failed: {e}")))?;

        loop {
            if token.is_cancelled() {
                break;
            }

            let mut status = "ok";
            match self.provider.check(&self.session).await {
                Ok(slots) => {
                    for slot in slots {
                        let envelope = EventEnvelope::new(
                            self.config.session_id.clone(),
                            Payload::AppointmentAvailable(slot.clone()),
                        );
                        if let Err(e) = self.bus.publish(envelope).await {
                            warn!(session_id = %self.config.session_id, error = %e, "failed to publish availability");
                        }
                        if let Some(planner) = &self.planner {
                            planner.on_availability(&self.config.session_id, slot.clone());
                        }
                        info!(
                            session_id = %self.config.session_id,
                            slot_id = %slot.slot_id,
                            slot_time = %slot.slot_time,
                            "published availability slot"
                        );
                    }
                }
                Err(e) => {
                    status = "error";
                    warn!(session_id = %self.config.session_id, error = %e, "availability check failed");
                }
            }

            self.emit_heartbeat(status).await;

            if token.is_cancelled() {
                break;
            }

            tokio::select! {
                () = token.cancelled() => break,
                () = tokio::time::sleep(Duration::from_secs(self.config.poll_interval_seconds)) => {}
            }
        }

        Ok(())
    }

    async fn emit_heartbeat(&self, status: &str) {
        let envelope = EventEnvelope::new(
            self.config.session_id.clone(),
            Payload::Heartbeat(HeartbeatPayload {
                agent: format!("monitor-{}", self.config.session_id),
                status: status.to_string(),
                timestamp: chrono::Utc::now(),
            }),
        );
        if let Err(e) = self.bus.publish(envelope).await {
            warn!(session_id = %self.config.session_id, error = %e, "failed to emit heartbeat");
        }
    }
}

/// The event type a [`MonitorAgent`] publishes slots under.
pub const MONITOR_EVENT_TYPE: EventType = EventType::AppointmentAvailable;

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use vigil_bus::InMemoryBus;
    use vigil_core::AppointmentAvailability;

    use super::*;

    fn config() -> AgentConfig {
        AgentConfig {
            session_id: "s-1".into(),
            user_id: "u-1".to_string(),
            poll_interval_seconds: 5,
            timezone: "UTC".to_string(),
            metadata: Default::default(),
        }
    }

    fn session() -> SessionRecord {
        SessionRecord {
            session_id: "s-1".into(),
            user_id: "u-1".to_string(),
            email: "u1@example.com".to_string(),
            credentials: Default::default(),
            profile: Default::default(),
            preferences: Default::default(),
            metadata: Default::default(),
            created_at: chrono::Utc::now(),
        }
    }

    struct OneShotProvider {
        fired: AtomicUsize,
    }

    #[async_trait]
    impl AvailabilityProvider for OneShotProvider {
        async fn ensure_login(&self, _session: &SessionRecord) -> AgentResult<()> {
            Ok(())
        }

        async fn check(&self, _session: &SessionRecord) -> AgentResult<Vec<AppointmentAvailability>> {
            if self.fired.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(vec![AppointmentAvailability {
                    session_id: "s-1".into(),
                    slot_id: "slot-1".to_string(),
                    slot_time: chrono::Utc::now(),
                    location: None,
                    extra: Default::default(),
                }])
            } else {
                Ok(Vec::new())
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn publishes_availability_and_heartbeat() {
        let bus: Arc<dyn MessageBus> = Arc::new(InMemoryBus::new());
        let mut sub = bus
            .subscribe(EventType::AppointmentAvailable, Some("s-1".into()), 10)
            .await
            .unwrap();

        let provider = Arc::new(OneShotProvider {
            fired: AtomicUsize::new(0),
        });
        let planner = AgentPlanner::new();
        let agent = Arc::new(MonitorAgent::new(
            config(),
            session(),
            Arc::clone(&bus),
            provider,
            Some(planner.clone()),
        ));

        agent.start().await;
        let envelope = sub.recv().await.expect("availability envelope");
        assert!(matches!(envelope.payload, Payload::AppointmentAvailable(_)));

        agent.stop().await;
        assert_eq!(
            planner.get_state(&"s-1".into()),
            vigil_planner::SessionState::Claiming
        );
    }

    #[tokio::test]
    async fn start_is_idempotent() {
        let bus: Arc<dyn MessageBus> = Arc::new(InMemoryBus::new());
        let provider = Arc::new(OneShotProvider {
            fired: AtomicUsize::new(0),
        });
        let agent = Arc::new(MonitorAgent::new(config(), session(), bus, provider, None));
        agent.start().await;
        agent.start().await;
        agent.stop().await;
    }
}
