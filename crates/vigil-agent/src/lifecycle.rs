//! Start/stop scaffolding shared by every long-running worker.

use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::{AgentError, AgentResult};

/// Start/stop/should-stop scaffolding for one long-running worker task.
///
/// Each concrete agent (monitor, booker) embeds one of these and drives it
/// with its own run body; this type owns only the spawn bookkeeping, not
/// any agent-specific state.
pub struct AgentLifecycle {
    name: String,
    token: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl AgentLifecycle {
    /// Construct lifecycle scaffolding for a worker named `name` (used in
    /// logs only).
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            token: CancellationToken::new(),
            task: Mutex::new(None),
        }
    }

    /// True once `stop()` has been called.
    #[must_use]
    pub fn should_stop(&self) -> bool {
        self.token.is_cancelled()
    }

    /// A clone of the cancellation token, for run bodies that need to
    /// race a suspension point against cancellation.
    #[must_use]
    pub fn stop_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Spawn `body` as the worker task. Idempotent: if a task is already
    /// running, this is a no-op — `start()` never spawns a second
    /// worker.
    pub async fn start_with<F, Fut>(&self, body: F)
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut guard = self.task.lock().await;
        if guard.is_some() {
            info!(agent = %self.name, "start: already running");
            return;
        }
        info!(agent = %self.name, "starting agent");
        *guard = Some(tokio::spawn(body(self.token.clone())));
    }

    /// Signal cooperative cancellation and wait for the worker to drain.
    /// Idempotent: calling `stop()` a second time, after the task has
    /// already been taken, is a no-op.
    pub async fn stop(&self) {
        self.token.cancel();
        let handle = self.task.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(agent = %self.name, error = %e, "agent task ended abnormally");
            }
        }
    }
}

/// Run `fut`, converting an unwinding panic into `Err(AgentError::Panicked)`
/// instead of letting it propagate out of the spawned task: unhandled
/// failures inside the worker body are logged and must not crash the
/// process.
pub async fn catch_panics<Fut>(fut: Fut) -> AgentResult<()>
where
    Fut: Future<Output = AgentResult<()>>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            Err(AgentError::Panicked(message))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test]
    async fn start_is_idempotent() {
        let lifecycle = AgentLifecycle::new("test");
        let spawn_count = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let spawn_count = Arc::clone(&spawn_count);
            lifecycle
                .start_with(move |token| async move {
                    spawn_count.fetch_add(1, Ordering::SeqCst);
                    token.cancelled().await;
                })
                .await;
        }

        lifecycle.stop().await;
        assert_eq!(spawn_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let lifecycle = AgentLifecycle::new("test");
        lifecycle
            .start_with(|token| async move {
                token.cancelled().await;
            })
            .await;
        lifecycle.stop().await;
        lifecycle.stop().await;
        assert!(lifecycle.should_stop());
    }

    #[tokio::test]
    async fn catch_panics_reports_panicked_error() {
        let result = catch_panics(async { panic!("boom") }).await;
        assert!(matches!(result, Err(AgentError::Panicked(_))));
    }

    #[tokio::test]
    async fn catch_panics_passes_through_ok() {
        let result = catch_panics(async { Ok(()) }).await;
        assert!(result.is_ok());
    }
}
