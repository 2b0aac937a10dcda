//! AES-256-GCM authenticated symmetric encryption.
//!
//! Used by `vigil-store` to encrypt the session-store file when a key is
//! configured (`AGENTBOT_SESSION_KEY`/`VIGIL_SESSION_KEY`). The on-disk
//! format is `nonce || ciphertext‖tag`, base64-free (raw bytes); callers
//! that need a text representation base64-encode the whole blob.

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Key};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use zeroize::Zeroizing;

use crate::error::{CryptoError, CryptoResult};

/// Length in bytes of an AES-256-GCM key.
pub const KEY_LEN: usize = 32;
/// Length in bytes of an AES-GCM nonce.
pub const NONCE_LEN: usize = 12;

/// A symmetric key for [`encrypt`]/[`decrypt`].
///
/// Wraps the raw key bytes in [`Zeroizing`] so the key material is wiped
/// from memory when dropped.
pub struct SessionKey(Zeroizing<[u8; KEY_LEN]>);

impl SessionKey {
    /// Decode a base64-encoded 32-byte key, as produced by
    /// `vigil keys generate` (see `original_source/scripts/generate_session_key.py`).
    pub fn from_base64(encoded: &str) -> CryptoResult<Self> {
        let bytes = BASE64
            .decode(encoded.trim())
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Build a key from raw bytes; must be exactly [`KEY_LEN`] bytes.
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        let array: [u8; KEY_LEN] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidKey(format!(
                "expected {KEY_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(Zeroizing::new(array)))
    }

    /// Generate a fresh random key and its base64 encoding, for
    /// `vigil keys generate`.
    #[must_use]
    pub fn generate() -> (Self, String) {
        let key = Aes256Gcm::generate_key(&mut OsRng);
        let encoded = BASE64.encode(key.as_slice());
        (Self(Zeroizing::new(key.into())), encoded)
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(self.0.as_slice()))
    }
}

/// Encrypt `plaintext` under `key`, returning `nonce || ciphertext`.
pub fn encrypt(key: &SessionKey, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
    let cipher = key.cipher();
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let mut ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;
    let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    out.extend_from_slice(nonce.as_slice());
    out.append(&mut ciphertext);
    Ok(out)
}

/// Decrypt a blob produced by [`encrypt`]. Fails loudly on any
/// authentication failure — wrong key, truncated file, or tampering.
pub fn decrypt(key: &SessionKey, blob: &[u8]) -> CryptoResult<Vec<u8>> {
    if blob.len() < NONCE_LEN {
        return Err(CryptoError::DecryptionFailed);
    }
    let (nonce_bytes, ciphertext) = blob.split_at(NONCE_LEN);
    let cipher = key.cipher();
    cipher
        .decrypt(nonce_bytes.into(), ciphertext)
        .map_err(|_| CryptoError::DecryptionFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_plaintext() {
        let (key, _) = SessionKey::generate();
        let plaintext = br#"[{"session_id":"s-1"}]"#;
        let blob = encrypt(&key, plaintext).unwrap();
        let recovered = decrypt(&key, &blob).unwrap();
        assert_eq!(recovered, plaintext);
    }

    #[test]
    fn wrong_key_fails_loudly() {
        let (key_a, _) = SessionKey::generate();
        let (key_b, _) = SessionKey::generate();
        let blob = encrypt(&key_a, b"secret session data").unwrap();
        let result = decrypt(&key_b, &blob);
        assert!(matches!(result, Err(CryptoError::DecryptionFailed)));
    }

    #[test]
    fn base64_round_trip() {
        let (_, encoded) = SessionKey::generate();
        let key = SessionKey::from_base64(&encoded).unwrap();
        let blob = encrypt(&key, b"hello").unwrap();
        assert_eq!(decrypt(&key, &blob).unwrap(), b"hello");
    }

    #[test]
    fn rejects_wrong_length_key() {
        let err = SessionKey::from_bytes(&[0u8; 10]).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidKey(_)));
    }

    #[test]
    fn truncated_blob_fails_loudly() {
        let (key, _) = SessionKey::generate();
        let blob = encrypt(&key, b"hello").unwrap();
        let truncated = &blob[..blob.len() - 2];
        assert!(decrypt(&key, truncated).is_err());
    }
}
