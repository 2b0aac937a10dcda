//! Vigil Runtime — bootstraps and supervises a monitor+booker pair per
//! session.
//!
//! [`RuntimeOrchestrator`] is the only public type: it reads every
//! persisted session from a `vigil-store::SessionStore`, hands each one
//! to caller-supplied factories to construct a monitor and a booker
//! [`Worker`], and then starts/stops/supervises the resulting bundles as
//! a group. It has no opinion on what a "monitor" or "booker" concretely
//! is — that's `vigil-agent`'s job — only on the start/stop contract
//! they expose.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(unreachable_pub)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod orchestrator;
mod worker;

pub use error::{RuntimeError, RuntimeResult};
pub use orchestrator::RuntimeOrchestrator;
pub use worker::Worker;
