//! External collaborator contracts.
//!
//! The browser driver, form-field identifier, CAPTCHA/stealth layer and
//! OTP reader are out of scope for this crate — they live behind
//! whatever implements these two traits.

use async_trait::async_trait;
use vigil_core::{AppointmentAvailability, AppointmentBookingRequest, BookingResultPayload, SessionRecord};

use crate::error::AgentResult;

/// Site-specific logic a monitor agent polls through.
#[async_trait]
pub trait AvailabilityProvider: Send + Sync {
    /// Called once before the poll loop starts. Allowed to be slow and
    /// interactive (CAPTCHA, OTP); a permanent failure should return
    /// `Err`.
    async fn ensure_login(&self, session: &SessionRecord) -> AgentResult<()>;

    /// Called every poll. Each returned slot belongs to `session`'s id.
    async fn check(&self, session: &SessionRecord) -> AgentResult<Vec<AppointmentAvailability>>;
}

/// Site-specific logic a booking agent invokes under its lock.
#[async_trait]
pub trait BookingProvider: Send + Sync {
    /// Attempt the reservation. Idempotent where the remote allows; on an
    /// ambiguous outcome (e.g. timeout after submit) return
    /// `success=false` with a message noting the possibly-booked state
    /// rather than erring.
    async fn book(
        &self,
        request: &AppointmentBookingRequest,
        session: &SessionRecord,
    ) -> AgentResult<BookingResultPayload>;
}

/// An availability provider that never reports a slot. Useful for wiring
/// tests that only exercise the monitor's heartbeat/login path.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAvailabilityProvider;

#[async_trait]
impl AvailabilityProvider for NullAvailabilityProvider {
    async fn ensure_login(&self, _session: &SessionRecord) -> AgentResult<()> {
        Ok(())
    }

    async fn check(&self, _session: &SessionRecord) -> AgentResult<Vec<AppointmentAvailability>> {
        Ok(Vec::new())
    }
}

/// A booking provider that always reports failure without contacting
/// anything. Useful as a safe default in tests that only exercise the
/// booking agent's lock/audit plumbing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBookingProvider;

#[async_trait]
impl BookingProvider for NullBookingProvider {
    async fn book(
        &self,
        request: &AppointmentBookingRequest,
        _session: &SessionRecord,
    ) -> AgentResult<BookingResultPayload> {
        Ok(BookingResultPayload {
            session_id: request.session_id.clone(),
            success: false,
            confirmation_number: None,
            message: Some("null booking provider never books".to_string()),
            slot: Some(request.slot.clone()),
            raw_response: None,
        })
    }
}
