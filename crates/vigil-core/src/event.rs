//! The typed event envelope carried on the message bus.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::session::SessionId;

/// Discriminant for the kind of event an [`EventEnvelope`] carries.
///
/// Kept in lockstep with [`Payload`]'s variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// A monitor agent observed a bookable slot.
    AppointmentAvailable,
    /// A request for a booking agent to attempt a reservation.
    BookingRequest,
    /// The outcome of a booking attempt.
    BookingResult,
    /// Periodic liveness signal from a monitor agent.
    Heartbeat,
    /// Out-of-band runtime notice, including the bus-closed sentinel.
    RuntimeAlert,
}

/// A single bookable appointment slot as observed by a monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentAvailability {
    /// The session that observed this slot.
    pub session_id: SessionId,
    /// Uniquely identifies the slot as seen by the monitor.
    pub slot_id: String,
    /// When the slot is scheduled.
    pub slot_time: DateTime<Utc>,
    /// Human-readable location, if the provider exposes one.
    #[serde(default)]
    pub location: Option<String>,
    /// Opaque provider-specific extras.
    #[serde(default)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// A request handed to a booking provider to attempt a reservation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentBookingRequest {
    /// The session attempting the booking.
    pub session_id: SessionId,
    /// The slot being claimed.
    pub slot: AppointmentAvailability,
    /// Opaque user profile data, forwarded from the session record.
    #[serde(default)]
    pub user_profile: BTreeMap<String, serde_json::Value>,
    /// Opaque preferences, forwarded from the session record.
    #[serde(default)]
    pub preferences: BTreeMap<String, serde_json::Value>,
}

/// The outcome of a booking attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingResultPayload {
    /// The session the attempt was made for.
    pub session_id: SessionId,
    /// Whether the reservation was confirmed.
    pub success: bool,
    /// Confirmation number, when the remote site provides one.
    #[serde(default)]
    pub confirmation_number: Option<String>,
    /// Human-readable explanation, especially for failures.
    #[serde(default)]
    pub message: Option<String>,
    /// The slot that was attempted.
    #[serde(default)]
    pub slot: Option<AppointmentAvailability>,
    /// Opaque raw provider response, for audit purposes.
    #[serde(default)]
    pub raw_response: Option<serde_json::Value>,
}

/// Periodic liveness signal emitted by a monitor agent after every poll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatPayload {
    /// Name of the agent emitting the heartbeat.
    pub agent: String,
    /// `"ok"` or `"error"`.
    pub status: String,
    /// When this heartbeat was taken.
    pub timestamp: DateTime<Utc>,
}

/// Out-of-band runtime notice.
///
/// `bus_closed: true` is the standardized sentinel delivered to every
/// subscription when [`crate`](crate)'s bus `close()`s.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeAlertPayload {
    /// Human-readable message.
    pub message: String,
    /// Set when this alert is the bus-closed shutdown sentinel.
    #[serde(default)]
    pub bus_closed: bool,
}

/// The tagged payload a [`EventEnvelope`] transports.
///
/// A systems-language rendition of the source's dynamically-typed
/// `payload: Dict[str, Any]` — see `DESIGN.md` for the tagged-enum
/// rationale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Payload {
    /// See [`EventType::AppointmentAvailable`].
    AppointmentAvailable(AppointmentAvailability),
    /// See [`EventType::BookingRequest`].
    BookingRequest(AppointmentBookingRequest),
    /// See [`EventType::BookingResult`].
    BookingResult(BookingResultPayload),
    /// See [`EventType::Heartbeat`].
    Heartbeat(HeartbeatPayload),
    /// See [`EventType::RuntimeAlert`].
    RuntimeAlert(RuntimeAlertPayload),
}

impl Payload {
    /// The [`EventType`] discriminant for this payload.
    #[must_use]
    pub fn event_type(&self) -> EventType {
        match self {
            Payload::AppointmentAvailable(_) => EventType::AppointmentAvailable,
            Payload::BookingRequest(_) => EventType::BookingRequest,
            Payload::BookingResult(_) => EventType::BookingResult,
            Payload::Heartbeat(_) => EventType::Heartbeat,
            Payload::RuntimeAlert(_) => EventType::RuntimeAlert,
        }
    }
}

/// The unit of communication transported on the message bus.
///
/// Immutable once published: every field is set at construction and
/// never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique id for this envelope.
    pub id: Uuid,
    /// When this envelope was created.
    pub created_at: DateTime<Utc>,
    /// Routing key. May be [`SessionId::BROADCAST`] for broadcast events.
    pub session_id: SessionId,
    /// The typed payload.
    pub payload: Payload,
    /// Optional correlation id linking related envelopes.
    #[serde(default)]
    pub trace_id: Option<String>,
}

impl EventEnvelope {
    /// Construct a new envelope routed to `session_id`, stamped with the
    /// current time and a fresh id.
    #[must_use]
    pub fn new(session_id: impl Into<SessionId>, payload: Payload) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            session_id: session_id.into(),
            payload,
            trace_id: None,
        }
    }

    /// Attach a correlation id.
    #[must_use]
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    /// Construct the standardized bus-closed sentinel broadcast to every
    /// subscription when a bus is closed.
    #[must_use]
    pub fn bus_closed_sentinel() -> Self {
        Self::new(
            SessionId::BROADCAST,
            Payload::RuntimeAlert(RuntimeAlertPayload {
                message: "message bus closed".to_string(),
                bus_closed: true,
            }),
        )
    }

    /// True if this envelope is the bus-closed sentinel.
    #[must_use]
    pub fn is_bus_closed(&self) -> bool {
        matches!(&self.payload, Payload::RuntimeAlert(alert) if alert.bus_closed)
    }

    /// The [`EventType`] discriminant of this envelope's payload.
    #[must_use]
    pub fn event_type(&self) -> EventType {
        self.payload.event_type()
    }

    /// True if `filter` matches this envelope's routing key: an exact
    /// match, or `filter` is `None`, or the envelope itself is broadcast.
    #[must_use]
    pub fn matches_session(&self, filter: Option<&SessionId>) -> bool {
        match filter {
            None => true,
            Some(wanted) => &self.session_id == wanted || self.session_id.is_broadcast(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot() -> AppointmentAvailability {
        AppointmentAvailability {
            session_id: SessionId::new("s-1"),
            slot_id: "slot-1".to_string(),
            slot_time: Utc::now(),
            location: None,
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn event_type_matches_payload() {
        let envelope = EventEnvelope::new("s-1", Payload::AppointmentAvailable(slot()));
        assert_eq!(envelope.event_type(), EventType::AppointmentAvailable);
    }

    #[test]
    fn broadcast_matches_any_filter() {
        let envelope = EventEnvelope::bus_closed_sentinel();
        assert!(envelope.matches_session(Some(&SessionId::new("s-1"))));
        assert!(envelope.matches_session(None));
        assert!(envelope.is_bus_closed());
    }

    #[test]
    fn session_filter_excludes_other_sessions() {
        let envelope = EventEnvelope::new("s-1", Payload::Heartbeat(HeartbeatPayload {
            agent: "monitor".to_string(),
            status: "ok".to_string(),
            timestamp: Utc::now(),
        }));
        assert!(!envelope.matches_session(Some(&SessionId::new("s-2"))));
        assert!(envelope.matches_session(Some(&SessionId::new("s-1"))));
    }
}
