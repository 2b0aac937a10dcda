//! The shape of a single audit-log line.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vigil_core::SessionId;

/// A single append-only audit record, as written one per line to the
/// on-disk log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// ISO-8601 UTC timestamp of the event.
    pub timestamp: DateTime<Utc>,
    /// Event name, e.g. `"booking_result"`.
    pub event: String,
    /// The session this entry concerns.
    pub session_id: SessionId,
    /// Arbitrary structured payload.
    pub payload: serde_json::Value,
}

impl AuditRecord {
    /// Construct a new record stamped with the current time.
    pub fn new(
        event: impl Into<String>,
        session_id: impl Into<SessionId>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            event: event.into(),
            session_id: session_id.into(),
            payload,
        }
    }
}
