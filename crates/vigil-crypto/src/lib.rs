//! Vigil Crypto — symmetric authenticated encryption for the session store.
//!
//! This crate provides AES-256-GCM encryption for the on-disk session
//! store (`vigil-store`), keyed by an operator-supplied base64 secret
//! (`VIGIL_SESSION_KEY`/`AGENTBOT_SESSION_KEY`). Unlike the teacher
//! workspace's `astrid-crypto` (ed25519 signing + BLAKE3 hashing for
//! audit-chain integrity), this runtime's threat model is "keep the
//! session file opaque at rest," so the primitive here is AEAD, not
//! signatures — see `DESIGN.md` for the grounding rationale.
//!
//! # Example
//!
//! ```
//! use vigil_crypto::{SessionKey, encrypt, decrypt};
//!
//! let (key, _encoded) = SessionKey::generate();
//! let ciphertext = encrypt(&key, b"session data").unwrap();
//! assert_eq!(decrypt(&key, &ciphertext).unwrap(), b"session data");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(unreachable_pub)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod cipher;
mod error;

pub use cipher::{KEY_LEN, NONCE_LEN, SessionKey, decrypt, encrypt};
pub use error::{CryptoError, CryptoResult};
