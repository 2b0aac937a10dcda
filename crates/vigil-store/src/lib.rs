//! Vigil Store — encrypted, file-backed session persistence.
//!
//! A thread-safe repository of [`vigil_core::SessionRecord`]s backed by a
//! single JSON file, optionally AES-256-GCM encrypted at rest (see
//! `vigil-crypto`). Modeled on the teacher workspace's `astrid-storage`
//! error/result conventions, scaled down from its KV/query-engine tiers to
//! this runtime's flat-file model.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(unreachable_pub)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod error;
mod store;

pub use error::{StoreError, StoreResult};
pub use store::SessionStore;
