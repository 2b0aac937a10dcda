//! Keys command — generate a session-store encryption key.
//!
//! Grounded on `original_source/scripts/generate_session_key.py`: prints
//! a fresh base64-encoded key for `VIGIL_SESSION_KEY`/`AGENTBOT_SESSION_KEY`,
//! nothing more.

use anyhow::Result;
use vigil_crypto::SessionKey;

pub(crate) fn generate() -> Result<()> {
    let (_key, encoded) = SessionKey::generate();
    println!("{encoded}");
    Ok(())
}
