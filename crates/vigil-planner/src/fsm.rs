//! The session state machine and its transition table.

use std::fmt;

/// Where a single session's booking attempt currently stands.
///
/// Transitions (initial state for a new session is `Idle`):
///
/// | from | event | to |
/// |---|---|---|
/// | any | `on_monitoring` | `Monitoring` |
/// | `Monitoring`, `Claiming`, `Failed` | `on_availability` | `Claiming` |
/// | `Claiming`, `Monitoring` | `on_booking_attempt` | `Booking` |
/// | `Booking` | `on_booking_result(success)` | `Booked` |
/// | `Booking` | `on_booking_result(failure)` | `Failed` |
/// | `Booked`, `Failed` | `reset` | `Idle` |
///
/// `Booked` and `Failed` are terminal; `Failed` is retryable via `reset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No monitoring or booking activity for this session yet.
    Idle,
    /// The monitor agent is polling for availability.
    Monitoring,
    /// A slot was observed and is being handed to the booking agent.
    Claiming,
    /// The booking agent holds (or is attempting to acquire) the lock.
    Booking,
    /// A booking attempt succeeded. Terminal.
    Booked,
    /// A booking attempt failed or was ambiguous. Terminal, but retryable.
    Failed,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Idle
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Monitoring => "monitoring",
            Self::Claiming => "claiming",
            Self::Booking => "booking",
            Self::Booked => "booked",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}
