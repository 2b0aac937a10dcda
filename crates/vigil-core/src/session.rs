//! Session records and the derived per-agent configuration.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{VigilError, VigilResult};

/// The minimum allowed poll interval, per spec.
pub const MIN_POLL_INTERVAL_SECONDS: u64 = 5;

/// A stable identifier for a persisted session.
///
/// Thin newtype wrapper so routing keys and map lookups can't be confused
/// with arbitrary strings at the type level.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    /// The wildcard routing key that matches every subscription filter.
    pub const BROADCAST: &'static str = "*";

    /// Build a session id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if this id is the broadcast wildcard.
    #[must_use]
    pub fn is_broadcast(&self) -> bool {
        self.0 == Self::BROADCAST
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A persisted user identity the runtime acts on behalf of.
///
/// Owned exclusively by the session store (see `vigil-store`); agents only
/// ever see snapshots handed to them at bootstrap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Primary key. Unique within the store.
    pub session_id: SessionId,
    /// Opaque application-level user identifier.
    pub user_id: String,
    /// Contact email, used by the (external) OTP reader.
    pub email: String,
    /// Opaque credential bag (site username/password, cookies, ...).
    #[serde(default)]
    pub credentials: BTreeMap<String, serde_json::Value>,
    /// Opaque browser/site profile bag.
    #[serde(default)]
    pub profile: BTreeMap<String, serde_json::Value>,
    /// Opaque preferences; may contain `poll_interval_seconds`.
    #[serde(default)]
    pub preferences: BTreeMap<String, serde_json::Value>,
    /// Opaque metadata, merged into the derived `AgentConfig`.
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
    /// When this record was created.
    pub created_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Derive the immutable per-agent configuration for this session.
    ///
    /// `default_poll` is used when `preferences.poll_interval_seconds` is
    /// absent or malformed.
    #[must_use]
    pub fn to_agent_config(&self, default_poll: u64) -> AgentConfig {
        let poll_interval_seconds = self
            .preferences
            .get("poll_interval_seconds")
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(default_poll)
            .max(MIN_POLL_INTERVAL_SECONDS);

        let timezone = self
            .preferences
            .get("timezone")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("UTC")
            .to_string();

        let mut metadata = self.metadata.clone();
        metadata.insert(
            "email".to_string(),
            serde_json::Value::String(self.email.clone()),
        );

        AgentConfig {
            session_id: self.session_id.clone(),
            user_id: self.user_id.clone(),
            poll_interval_seconds,
            timezone,
            metadata,
        }
    }
}

/// Derived, immutable configuration for a single agent instance.
///
/// Computed once at runtime bootstrap from a [`SessionRecord`]; never
/// persisted on its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// The session this agent acts on behalf of.
    pub session_id: SessionId,
    /// Opaque application-level user identifier.
    pub user_id: String,
    /// Poll cadence for the monitor agent. Always `>= 5`.
    pub poll_interval_seconds: u64,
    /// IANA timezone name, informational.
    pub timezone: String,
    /// Opaque metadata (includes `email`).
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl AgentConfig {
    /// Validate invariants that the derivation above always upholds, but
    /// that a hand-built `AgentConfig` (e.g. in tests) might not.
    pub fn validate(&self) -> VigilResult<()> {
        if self.poll_interval_seconds < MIN_POLL_INTERVAL_SECONDS {
            return Err(VigilError::InvalidValue {
                field: "poll_interval_seconds",
                reason: format!(
                    "must be >= {MIN_POLL_INTERVAL_SECONDS}, got {}",
                    self.poll_interval_seconds
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> SessionRecord {
        SessionRecord {
            session_id: SessionId::new("s-1"),
            user_id: "u-1".to_string(),
            email: "u1@example.com".to_string(),
            credentials: BTreeMap::new(),
            profile: BTreeMap::new(),
            preferences: BTreeMap::new(),
            metadata: BTreeMap::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn derives_default_poll_interval() {
        let config = record().to_agent_config(30);
        assert_eq!(config.poll_interval_seconds, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn honors_preference_override_but_enforces_floor() {
        let mut r = record();
        r.preferences.insert(
            "poll_interval_seconds".to_string(),
            serde_json::Value::from(2_u64),
        );
        let config = r.to_agent_config(30);
        assert_eq!(config.poll_interval_seconds, MIN_POLL_INTERVAL_SECONDS);
    }

    #[test]
    fn broadcast_id_recognized() {
        assert!(SessionId::new("*").is_broadcast());
        assert!(!SessionId::new("s-1").is_broadcast());
    }
}
