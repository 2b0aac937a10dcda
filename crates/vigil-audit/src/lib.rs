//! Vigil Audit — append-only JSON-lines audit trail.
//!
//! Structurally lighter than the teacher workspace's `astrid-audit`
//! (no chain-linking or ed25519 signing — this runtime only needs a
//! plain JSON-lines sink), but grounded on the same mutex-serialized,
//! off-thread-write shape.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(unreachable_pub)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod entry;
mod error;
mod log;

pub use entry::AuditRecord;
pub use error::{AuditError, AuditResult};
pub use log::AuditLog;
