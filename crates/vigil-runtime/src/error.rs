//! Runtime orchestrator error types.

use thiserror::Error;

/// Errors surfaced by the runtime orchestrator.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// A monitor or booking factory raised while constructing a worker for
    /// one session. This session is skipped and every other session
    /// still proceeds — this variant is logged, not propagated.
    #[error("worker factory failed for session {session_id}: {reason}")]
    FactoryFailed {
        /// The session the factory was building a worker for.
        session_id: String,
        /// What the factory reported.
        reason: String,
    },

    /// The message bus rejected an operation (e.g. already closed).
    #[error("message bus error: {0}")]
    Bus(#[from] vigil_bus::BusError),

    /// The session store could not be listed.
    #[error("session store error: {0}")]
    Store(#[from] vigil_store::StoreError),
}

/// Result type for runtime orchestrator operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
