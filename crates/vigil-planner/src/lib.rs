//! Vigil Planner — per-session finite-state tracking.
//!
//! The planner holds no authoritative truth of its own: it is an
//! in-memory observational record of where each session's booking
//! attempt stands. The audit log plus the remote site's own
//! confirmation are authoritative for "did we actually book it."

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(unreachable_pub)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod fsm;
mod planner;

pub use fsm::SessionState;
pub use planner::{AgentPlanner, SessionSnapshot};
