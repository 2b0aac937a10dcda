//! Run command — bootstraps and drives the runtime until interrupted.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use vigil_agent::{BookingAgent, MonitorAgent, NullAvailabilityProvider, NullBookingProvider};
use vigil_audit::AuditLog;
use vigil_bus::MessageBus;
use vigil_config::BusBackend;
use vigil_lock::LockManager;
use vigil_planner::AgentPlanner;
use vigil_runtime::{RuntimeOrchestrator, Worker};
use vigil_store::SessionStore;

/// A [`Worker`] adapter around [`MonitorAgent`]'s `&Arc<Self>` receivers.
///
/// `vigil-runtime` only knows the [`Worker`] trait; this wrapper is the
/// seam that lets the orchestrator hold `Arc<dyn Worker>` without
/// depending on `vigil-agent` itself.
struct MonitorHandle(Arc<MonitorAgent>);

#[async_trait]
impl Worker for MonitorHandle {
    async fn start(&self) {
        self.0.start().await;
    }

    async fn stop(&self) {
        self.0.stop().await;
    }
}

struct BookingHandle(Arc<BookingAgent>);

#[async_trait]
impl Worker for BookingHandle {
    async fn start(&self) {
        self.0.start().await;
    }

    async fn stop(&self) {
        self.0.stop().await;
    }
}

/// Load `config_path`, bootstrap one monitor/booker pair per persisted
/// session, and run until `SIGINT`/`SIGTERM`.
pub(crate) async fn run(config_path: &Path) -> Result<()> {
    let effective = vigil_config::load(config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    let store = Arc::new(
        SessionStore::open(
            effective.runtime.session_store_path.clone(),
            effective.session_key,
        )
        .await
        .context("opening session store")?,
    );

    let audit = AuditLog::open(effective.audit_log_path.clone())
        .await
        .context("opening audit log")?;

    let bus: Arc<dyn MessageBus> = match effective.bus_backend {
        BusBackend::Memory => Arc::new(vigil_bus::InMemoryBus::new()),
        BusBackend::Redis => {
            let url = effective
                .redis_url
                .as_deref()
                .context("VIGIL_BUS=redis requires REDIS_URL")?;
            Arc::new(vigil_bus::RedisBus::new(url).context("connecting to Redis bus")?)
        }
    };

    let locks: Arc<dyn LockManager> = match effective.bus_backend {
        BusBackend::Memory => Arc::new(vigil_lock::InProcessLockManager::new()),
        BusBackend::Redis => {
            let url = effective
                .redis_url
                .as_deref()
                .context("VIGIL_BUS=redis requires REDIS_URL")?;
            Arc::new(vigil_lock::RedisLockManager::new(url).context("connecting to Redis lock backend")?)
        }
    };

    let planner = AgentPlanner::new();

    let orchestrator = Arc::new(RuntimeOrchestrator::new(
        Arc::clone(&store),
        Arc::clone(&bus),
        effective.runtime.poll_interval_seconds,
    ));

    let bundled = orchestrator
        .bootstrap(
            {
                let bus = Arc::clone(&bus);
                let planner = planner.clone();
                move |config, session| {
                    let monitor = MonitorAgent::new(
                        config.clone(),
                        session.clone(),
                        Arc::clone(&bus),
                        Arc::new(NullAvailabilityProvider),
                        Some(planner.clone()),
                    );
                    Ok(Arc::new(MonitorHandle(Arc::new(monitor))) as Arc<dyn Worker>)
                }
            },
            {
                let bus = Arc::clone(&bus);
                let locks = Arc::clone(&locks);
                let planner = planner.clone();
                let audit = audit.clone();
                move |config, session| {
                    let booker = BookingAgent::new(
                        config.clone(),
                        session.clone(),
                        Arc::clone(&bus),
                        Arc::new(NullBookingProvider),
                        Some(Arc::clone(&locks)),
                        Some(planner.clone()),
                        Some(audit.clone()),
                    );
                    Ok(Arc::new(BookingHandle(Arc::new(booker))) as Arc<dyn Worker>)
                }
            },
        )
        .await
        .context("bootstrapping runtime")?;

    println!("vigil: {bundled} session(s) bootstrapped; running until interrupted");
    orchestrator.run_forever().await;
    println!("vigil: shut down cleanly");

    Ok(())
}
