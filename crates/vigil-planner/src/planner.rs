//! The tracking helper that advances each session's [`SessionState`].

use dashmap::DashMap;
use tracing::{trace, warn};
use vigil_core::{AppointmentAvailability, BookingResultPayload, SessionId};

use crate::fsm::SessionState;

/// A session's current state plus the last slot observed and the last
/// booking result recorded, for callers that want more than the bare
/// state (e.g. an admin surface rendering "why is this session stuck").
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    /// Current FSM state.
    pub state: SessionState,
    /// The most recent availability handed to `on_availability`, if any.
    pub last_slot: Option<AppointmentAvailability>,
    /// The most recent result handed to `on_booking_result`, if any.
    pub last_result: Option<BookingResultPayload>,
}

/// Owns one [`SessionSnapshot`] per session, advancing it through
/// [`SessionState`]'s transition table.
///
/// Sessions are created lazily on first contact, starting at `Idle`.
/// Cheap to clone: all clones share the same table.
#[derive(Clone, Default)]
pub struct AgentPlanner {
    sessions: std::sync::Arc<DashMap<SessionId, SessionSnapshot>>,
}

impl AgentPlanner {
    /// Construct a planner with no tracked sessions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `any -> Monitoring`. Idempotent: calling this while already
    /// `Monitoring` leaves the state unchanged.
    pub fn on_monitoring(&self, session_id: &SessionId) {
        let mut entry = self.sessions.entry(session_id.clone()).or_default();
        if entry.state == SessionState::Monitoring {
            trace!(%session_id, "on_monitoring: already monitoring");
            return;
        }
        entry.state = SessionState::Monitoring;
    }

    /// `{Monitoring, Claiming, Failed} -> Claiming`. Calls from any other
    /// state are ignored (the slot is still recorded on the snapshot for
    /// observability, but the state does not advance).
    pub fn on_availability(&self, session_id: &SessionId, slot: AppointmentAvailability) {
        let mut entry = self.sessions.entry(session_id.clone()).or_default();
        entry.last_slot = Some(slot);
        match entry.state {
            SessionState::Monitoring | SessionState::Claiming | SessionState::Failed => {
                entry.state = SessionState::Claiming;
            }
            other => {
                warn!(%session_id, from = %other, "on_availability called out of sequence");
            }
        }
    }

    /// `{Claiming, Monitoring} -> Booking`.
    pub fn on_booking_attempt(&self, session_id: &SessionId) {
        let mut entry = self.sessions.entry(session_id.clone()).or_default();
        match entry.state {
            SessionState::Claiming | SessionState::Monitoring => {
                entry.state = SessionState::Booking;
            }
            other => {
                warn!(%session_id, from = %other, "on_booking_attempt called out of sequence");
            }
        }
    }

    /// `Booking -> Booked` (on success) or `Booking -> Failed` (on
    /// failure). Returns the resulting state. The result is recorded on
    /// the snapshot even when called out of sequence.
    pub fn on_booking_result(
        &self,
        session_id: &SessionId,
        result: BookingResultPayload,
    ) -> SessionState {
        let mut entry = self.sessions.entry(session_id.clone()).or_default();
        let success = result.success;
        entry.last_result = Some(result);
        if entry.state != SessionState::Booking {
            warn!(%session_id, from = %entry.state, "on_booking_result called out of sequence");
        }
        entry.state = if success {
            SessionState::Booked
        } else {
            SessionState::Failed
        };
        entry.state
    }

    /// `{Booked, Failed} -> Idle`. A no-op for sessions not yet tracked
    /// or in any other state.
    pub fn reset(&self, session_id: &SessionId) {
        if let Some(mut entry) = self.sessions.get_mut(session_id) {
            if matches!(entry.state, SessionState::Booked | SessionState::Failed) {
                *entry = SessionSnapshot {
                    state: SessionState::Idle,
                    ..Default::default()
                };
            }
        }
    }

    /// Current state for `session_id`, or `Idle` if untracked.
    #[must_use]
    pub fn get_state(&self, session_id: &SessionId) -> SessionState {
        self.sessions
            .get(session_id)
            .map_or(SessionState::Idle, |entry| entry.state)
    }

    /// Full snapshot for `session_id`, or the default (idle, no history)
    /// if untracked.
    #[must_use]
    pub fn snapshot(&self, session_id: &SessionId) -> SessionSnapshot {
        self.sessions.get(session_id).map_or_else(SessionSnapshot::default, |entry| entry.clone())
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn slot(id: &str) -> AppointmentAvailability {
        AppointmentAvailability {
            session_id: SessionId::from(id),
            slot_id: "slot-1".to_string(),
            slot_time: chrono::Utc::now(),
            location: None,
            extra: Default::default(),
        }
    }

    fn result(success: bool) -> BookingResultPayload {
        BookingResultPayload {
            session_id: SessionId::from("s-1"),
            success,
            confirmation_number: None,
            message: None,
            slot: None,
            raw_response: None,
        }
    }

    #[test]
    fn follows_happy_path_transitions() {
        let planner = AgentPlanner::new();
        let session_id = SessionId::from("s-1");

        assert_eq!(planner.get_state(&session_id), SessionState::Idle);

        planner.on_monitoring(&session_id);
        assert_eq!(planner.get_state(&session_id), SessionState::Monitoring);

        planner.on_availability(&session_id, slot("s-1"));
        assert_eq!(planner.get_state(&session_id), SessionState::Claiming);

        planner.on_booking_attempt(&session_id);
        assert_eq!(planner.get_state(&session_id), SessionState::Booking);

        let ending = planner.on_booking_result(&session_id, result(true));
        assert_eq!(ending, SessionState::Booked);
        assert_eq!(planner.get_state(&session_id), SessionState::Booked);
    }

    #[test]
    fn failed_booking_is_retryable_via_reset() {
        let planner = AgentPlanner::new();
        let session_id = SessionId::from("s-1");

        planner.on_monitoring(&session_id);
        planner.on_availability(&session_id, slot("s-1"));
        planner.on_booking_attempt(&session_id);
        planner.on_booking_result(&session_id, result(false));
        assert_eq!(planner.get_state(&session_id), SessionState::Failed);

        planner.reset(&session_id);
        assert_eq!(planner.get_state(&session_id), SessionState::Idle);
    }

    #[test]
    fn on_monitoring_is_idempotent() {
        let planner = AgentPlanner::new();
        let session_id = SessionId::from("s-1");
        planner.on_monitoring(&session_id);
        planner.on_monitoring(&session_id);
        assert_eq!(planner.get_state(&session_id), SessionState::Monitoring);
    }

    #[test]
    fn availability_from_failed_reopens_claiming() {
        let planner = AgentPlanner::new();
        let session_id = SessionId::from("s-1");
        planner.on_monitoring(&session_id);
        planner.on_availability(&session_id, slot("s-1"));
        planner.on_booking_attempt(&session_id);
        planner.on_booking_result(&session_id, result(false));
        assert_eq!(planner.get_state(&session_id), SessionState::Failed);

        planner.on_availability(&session_id, slot("s-2"));
        assert_eq!(planner.get_state(&session_id), SessionState::Claiming);
    }

    #[test]
    fn reset_before_terminal_state_is_a_no_op() {
        let planner = AgentPlanner::new();
        let session_id = SessionId::from("s-1");
        planner.on_monitoring(&session_id);
        planner.reset(&session_id);
        assert_eq!(planner.get_state(&session_id), SessionState::Monitoring);
    }

    #[test]
    fn booking_attempt_out_of_sequence_does_not_advance() {
        let planner = AgentPlanner::new();
        let session_id = SessionId::from("s-1");
        planner.on_booking_attempt(&session_id);
        assert_eq!(planner.get_state(&session_id), SessionState::Idle);
    }

    #[test]
    fn untracked_session_reports_idle() {
        let planner = AgentPlanner::new();
        let session_id = SessionId::from("ghost");
        assert_eq!(planner.get_state(&session_id), SessionState::Idle);
    }

    proptest! {
        /// Replaying the same booking result against an
        /// already-`Booked`/`Failed` session never moves it anywhere
        /// else — `on_booking_result` is idempotent under repetition.
        #[test]
        fn on_booking_result_is_idempotent_under_repetition(success: bool, repeats in 1usize..8) {
            let planner = AgentPlanner::new();
            let session_id = SessionId::from("s-1");
            planner.on_monitoring(&session_id);
            planner.on_availability(&session_id, slot("s-1"));
            planner.on_booking_attempt(&session_id);

            let expected = planner.on_booking_result(&session_id, result(success));
            for _ in 0..repeats {
                let replayed = planner.on_booking_result(&session_id, result(success));
                prop_assert_eq!(replayed, expected);
                prop_assert_eq!(planner.get_state(&session_id), expected);
            }
        }
    }
}
