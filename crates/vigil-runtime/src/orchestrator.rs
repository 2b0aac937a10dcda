//! Runtime orchestrator: bootstraps one monitor+booker bundle per
//! persisted session and supervises them as a group.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::join_all;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use vigil_bus::MessageBus;
use vigil_core::{AgentConfig, SessionRecord};
use vigil_store::SessionStore;

use crate::error::RuntimeResult;
use crate::worker::Worker;

struct SessionBundle {
    session_id: String,
    monitor: Arc<dyn Worker>,
    booker: Arc<dyn Worker>,
}

/// Bootstraps and supervises one monitor+booker [`Worker`] pair per
/// session.
///
/// Workers are independent: a panic or error inside one bundle's factory
/// is logged and that session is skipped, it never aborts bootstrapping
/// the rest. `start()`/`stop()` are idempotent, matching the agents
/// underneath.
pub struct RuntimeOrchestrator {
    store: Arc<SessionStore>,
    bus: Arc<dyn MessageBus>,
    default_poll_interval_seconds: u64,
    bundles: Mutex<Vec<SessionBundle>>,
    started: Mutex<bool>,
}

impl RuntimeOrchestrator {
    /// Construct an orchestrator reading sessions from `store` and
    /// dispatching through `bus`. `default_poll_interval_seconds` is used
    /// for sessions whose preferences don't override their own
    /// `poll_interval_seconds`.
    #[must_use]
    pub fn new(
        store: Arc<SessionStore>,
        bus: Arc<dyn MessageBus>,
        default_poll_interval_seconds: u64,
    ) -> Self {
        Self {
            store,
            bus,
            default_poll_interval_seconds,
            bundles: Mutex::new(Vec::new()),
            started: Mutex::new(false),
        }
    }

    /// The bus this orchestrator dispatches through, for callers wiring
    /// up additional subscribers (e.g. an admin surface).
    #[must_use]
    pub fn bus(&self) -> Arc<dyn MessageBus> {
        Arc::clone(&self.bus)
    }

    /// Read every [`SessionRecord`] from the store and construct one
    /// monitor + one booker per session via the supplied factories.
    ///
    /// `monitor_factory`/`booking_factory` receive the derived
    /// [`AgentConfig`] and the [`SessionRecord`] it was derived from, and
    /// return a started-capable [`Worker`] — this crate's
    /// dependency-injection seam. A factory error for one session is
    /// logged and that session is skipped; every other session still
    /// bootstraps.
    pub async fn bootstrap<MF, BF>(
        &self,
        monitor_factory: MF,
        booking_factory: BF,
    ) -> RuntimeResult<usize>
    where
        MF: Fn(&AgentConfig, &SessionRecord) -> RuntimeResult<Arc<dyn Worker>>,
        BF: Fn(&AgentConfig, &SessionRecord) -> RuntimeResult<Arc<dyn Worker>>,
    {
        let sessions = self.store.list().await;
        let mut bundles = self.bundles.lock().await;
        bundles.clear();

        for session in &sessions {
            let config = session.to_agent_config(self.default_poll_interval_seconds);
            if let Err(e) = config.validate() {
                error!(session_id = %session.session_id, error = %e, "skipping session: invalid derived config");
                continue;
            }

            let monitor = match monitor_factory(&config, session) {
                Ok(worker) => worker,
                Err(e) => {
                    error!(session_id = %session.session_id, error = %e, "skipping session: monitor factory failed");
                    continue;
                }
            };
            let booker = match booking_factory(&config, session) {
                Ok(worker) => worker,
                Err(e) => {
                    error!(session_id = %session.session_id, error = %e, "skipping session: booking factory failed");
                    continue;
                }
            };

            bundles.push(SessionBundle {
                session_id: session.session_id.to_string(),
                monitor,
                booker,
            });
        }

        info!(
            sessions = sessions.len(),
            bundled = bundles.len(),
            "bootstrap complete"
        );
        Ok(bundles.len())
    }

    /// Start every bundled monitor and booker (idempotent).
    pub async fn start(&self) {
        let mut started = self.started.lock().await;
        if *started {
            info!("start: runtime already started");
            return;
        }
        *started = true;
        drop(started);

        let bundles = self.bundles.lock().await;
        info!(bundles = bundles.len(), "starting runtime");
        let starts = bundles.iter().flat_map(|bundle| {
            [
                run_catching(bundle.monitor.start(), &bundle.session_id, "monitor"),
                run_catching(bundle.booker.start(), &bundle.session_id, "booker"),
            ]
        });
        join_all(starts).await;
    }

    /// Cancel every bundled worker in parallel, wait for them to finish,
    /// then close the bus. Per-worker failures are logged, never
    /// propagated.
    pub async fn stop(&self) {
        let bundles = self.bundles.lock().await;
        info!(bundles = bundles.len(), "stopping runtime");
        let stops = bundles.iter().flat_map(|bundle| {
            [
                run_catching(bundle.monitor.stop(), &bundle.session_id, "monitor"),
                run_catching(bundle.booker.stop(), &bundle.session_id, "booker"),
            ]
        });
        join_all(stops).await;
        drop(bundles);

        if let Err(e) = self.bus.close().await {
            warn!(error = %e, "failed to close message bus during shutdown");
        }
    }

    /// Run until an external cancellation (SIGINT/SIGTERM), then `stop()`.
    ///
    /// Convenience wrapper for process lifetime; does not call
    /// `start()` itself — call it first if bundles aren't running yet.
    pub async fn run_forever(&self) {
        self.start().await;
        wait_for_shutdown_signal().await;
        info!("shutdown signal received");
        self.stop().await;
    }

    /// Number of bundles currently tracked, for diagnostics and tests.
    pub async fn bundle_count(&self) -> usize {
        self.bundles.lock().await.len()
    }
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "failed to install SIGTERM handler; falling back to ctrl_c only");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

/// Run `fut`, converting a panic into a logged warning rather than
/// letting it propagate out of the `join_all`: exceptions from
/// individual workers are collected, not propagated.
async fn run_catching(fut: impl std::future::Future<Output = ()>, session_id: &str, role: &str) {
    if AssertUnwindSafe(fut).catch_unwind().await.is_err() {
        warn!(session_id, role, "worker panicked during start/stop");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;
    use vigil_bus::InMemoryBus;
    use vigil_core::SessionId;

    use super::*;

    fn session(id: &str) -> SessionRecord {
        SessionRecord {
            session_id: SessionId::new(id),
            user_id: format!("u-{id}"),
            email: format!("{id}@example.com"),
            credentials: Default::default(),
            profile: Default::default(),
            preferences: Default::default(),
            metadata: Default::default(),
            created_at: Utc::now(),
        }
    }

    #[derive(Default)]
    struct CountingWorker {
        starts: AtomicUsize,
        stops: AtomicUsize,
    }

    #[async_trait]
    impl Worker for CountingWorker {
        async fn start(&self) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        async fn stop(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    async fn store_with(sessions: &[&str]) -> Arc<SessionStore> {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open(dir.path().join("sessions.json"), None)
            .await
            .unwrap();
        for id in sessions {
            store.upsert(session(id)).await.unwrap();
        }
        Arc::new(store)
    }

    #[tokio::test]
    async fn bootstrap_builds_one_bundle_per_session() {
        let store = store_with(&["s-1", "s-2"]).await;
        let bus: Arc<dyn MessageBus> = Arc::new(InMemoryBus::new());
        let orchestrator = RuntimeOrchestrator::new(store, bus, 30);

        let count = orchestrator
            .bootstrap(
                |_, _| Ok(Arc::new(CountingWorker::default()) as Arc<dyn Worker>),
                |_, _| Ok(Arc::new(CountingWorker::default()) as Arc<dyn Worker>),
            )
            .await
            .unwrap();

        assert_eq!(count, 2);
        assert_eq!(orchestrator.bundle_count().await, 2);
    }

    #[tokio::test]
    async fn factory_failure_skips_only_that_session() {
        let store = store_with(&["s-1", "s-2"]).await;
        let bus: Arc<dyn MessageBus> = Arc::new(InMemoryBus::new());
        let orchestrator = RuntimeOrchestrator::new(store, bus, 30);

        let count = orchestrator
            .bootstrap(
                |config, _| {
                    if config.session_id == SessionId::new("s-1") {
                        Err(crate::error::RuntimeError::FactoryFailed {
                            session_id: config.session_id.to_string(),
                            reason: "boom".to_string(),
                        })
                    } else {
                        Ok(Arc::new(CountingWorker::default()) as Arc<dyn Worker>)
                    }
                },
                |_, _| Ok(Arc::new(CountingWorker::default()) as Arc<dyn Worker>),
            )
            .await
            .unwrap();

        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn start_is_idempotent_and_stop_closes_bus() {
        let store = store_with(&["s-1"]).await;
        let bus: Arc<dyn MessageBus> = Arc::new(InMemoryBus::new());
        let mut sub = bus
            .subscribe(vigil_core::EventType::RuntimeAlert, None, 10)
            .await
            .unwrap();
        let orchestrator = RuntimeOrchestrator::new(store, Arc::clone(&bus), 30);

        let monitor = Arc::new(CountingWorker::default());
        let monitor_for_factory = Arc::clone(&monitor);
        orchestrator
            .bootstrap(
                move |_, _| Ok(Arc::clone(&monitor_for_factory) as Arc<dyn Worker>),
                |_, _| Ok(Arc::new(CountingWorker::default()) as Arc<dyn Worker>),
            )
            .await
            .unwrap();

        orchestrator.start().await;
        orchestrator.start().await;
        assert_eq!(monitor.starts.load(Ordering::SeqCst), 1);

        orchestrator.stop().await;
        orchestrator.stop().await;

        let sentinel = sub.recv().await.unwrap();
        assert!(sentinel.is_bus_closed());
    }
}
