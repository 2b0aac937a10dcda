//! The minimal contract the orchestrator drives every bundled agent
//! through.
//!
//! This crate deliberately does not depend on `vigil-agent`: the
//! orchestrator only ever calls `start`/`stop` on whatever a factory
//! hands it — factories receive `AgentConfig` and `SessionRecord` and
//! return a started-capable worker. A monitor or booking agent satisfies this
//! trait through a thin adapter at the call site — see
//! `vigil-cli`'s `run` command for the wiring.

use async_trait::async_trait;

/// Start/stop scaffolding the orchestrator can drive without knowing the
/// concrete agent type underneath.
///
/// Mirrors `vigil-agent`'s agent lifecycle surface (`start`, `stop`) at
/// the trait level, since its monitor and booking agents both expose
/// that same shape but have no shared base type of their own.
#[async_trait]
pub trait Worker: Send + Sync {
    /// Start the worker (idempotent, per the agent's own `start()`).
    async fn start(&self);

    /// Cooperatively stop the worker and wait for it to drain (idempotent).
    async fn stop(&self);
}
