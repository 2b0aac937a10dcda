//! Agent-level error types.

use thiserror::Error;

/// Errors surfaced by agent workers.
///
/// Provider errors never escape an agent's run loop on their own: a
/// monitor swallows them into a `status=error` heartbeat, and a booker
/// turns them into a failed [`vigil_core::BookingResultPayload`]. This
/// type exists for the narrower cases that still need a `Result` at the
/// boundary — chiefly a caught panic inside the worker body.
#[derive(Debug, Error)]
pub enum AgentError {
    /// An external provider call failed.
    #[error("provider error: {0}")]
    Provider(String),
    /// The worker body panicked; the panic message, if recoverable.
    #[error("agent panicked: {0}")]
    Panicked(String),
}

/// Result type for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;
