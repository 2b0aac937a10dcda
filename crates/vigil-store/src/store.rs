//! Encrypted, file-backed repository of [`SessionRecord`]s.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use vigil_core::{SessionId, SessionRecord};
use vigil_crypto::SessionKey;

use crate::error::{StoreError, StoreResult};

/// A thread-safe repository of [`SessionRecord`]s persisted to a single
/// file.
///
/// When a [`SessionKey`] is configured, the file is AES-256-GCM encrypted
/// on disk; decryption failure is always a hard error (`fail loudly`),
/// never a silent fallback. Without a key, the file is plain UTF-8 JSON.
pub struct SessionStore {
    path: PathBuf,
    key: Option<SessionKey>,
    records: Arc<Mutex<BTreeMap<SessionId, SessionRecord>>>,
}

impl SessionStore {
    /// Open (or create) the store at `path`.
    ///
    /// If the file exists, it is loaded and validated immediately; an
    /// invalid record shape or a decryption failure fails this call with a
    /// descriptive error rather than starting with stale or empty state.
    pub async fn open(path: impl Into<PathBuf>, key: Option<SessionKey>) -> StoreResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| StoreError::Io {
                        path: parent.display().to_string(),
                        source,
                    })?;
            }
        }

        let records = if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            info!(path = %path.display(), "loading session store");
            Self::load_from_disk(&path, key.as_ref()).await?
        } else {
            debug!(path = %path.display(), "session store file absent; starting empty");
            BTreeMap::new()
        };

        Ok(Self {
            path,
            key,
            records: Arc::new(Mutex::new(records)),
        })
    }

    async fn load_from_disk(
        path: &Path,
        key: Option<&SessionKey>,
    ) -> StoreResult<BTreeMap<SessionId, SessionRecord>> {
        let raw = tokio::fs::read(path)
            .await
            .map_err(|source| StoreError::Io {
                path: path.display().to_string(),
                source,
            })?;

        if raw.is_empty() {
            return Ok(BTreeMap::new());
        }

        let json_bytes = match key {
            Some(key) => vigil_crypto::decrypt(key, &raw)?,
            None => raw,
        };

        let values: Vec<serde_json::Value> = serde_json::from_slice(&json_bytes)
            .map_err(|e| StoreError::Malformed(e.to_string()))?;

        let mut records = BTreeMap::new();
        for (index, value) in values.into_iter().enumerate() {
            let record: SessionRecord = serde_json::from_value(value)
                .map_err(|e| StoreError::InvalidRecord {
                    index,
                    reason: e.to_string(),
                })?;
            records.insert(record.session_id.clone(), record);
        }
        Ok(records)
    }

    /// List every persisted session record.
    pub async fn list(&self) -> Vec<SessionRecord> {
        self.records.lock().await.values().cloned().collect()
    }

    /// Fetch a single session record by id.
    pub async fn get(&self, session_id: &SessionId) -> Option<SessionRecord> {
        self.records.lock().await.get(session_id).cloned()
    }

    /// Insert or replace a session record, persisting immediately.
    ///
    /// Atomic with respect to concurrent readers of this store instance:
    /// a `get` that starts after this returns always observes the new
    /// value.
    pub async fn upsert(&self, record: SessionRecord) -> StoreResult<()> {
        let mut guard = self.records.lock().await;
        guard.insert(record.session_id.clone(), record);
        self.dump(&guard).await
    }

    /// Remove a session record, persisting immediately. No-op if absent.
    pub async fn delete(&self, session_id: &SessionId) -> StoreResult<()> {
        let mut guard = self.records.lock().await;
        if guard.remove(session_id).is_some() {
            self.dump(&guard).await?;
        }
        Ok(())
    }

    /// Write `records` atomically: write to a sibling `.tmp` file, then
    /// rename over the real path. Prevents truncating the store into a
    /// half-written, unreadable file if the process is killed mid-write.
    async fn dump(&self, records: &BTreeMap<SessionId, SessionRecord>) -> StoreResult<()> {
        let values: Vec<&SessionRecord> = records.values().collect();
        let json = serde_json::to_vec_pretty(&values)
            .map_err(|e| StoreError::Malformed(e.to_string()))?;

        let payload = match &self.key {
            Some(key) => vigil_crypto::encrypt(key, &json)?,
            None => json,
        };

        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, &payload)
            .await
            .map_err(|source| StoreError::Io {
                path: temp_path.display().to_string(),
                source,
            })?;

        if let Err(source) = tokio::fs::rename(&temp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(StoreError::Io {
                path: self.path.display().to_string(),
                source,
            });
        }
        Ok(())
    }

    /// Path this store persists to, for diagnostics.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True if this store encrypts its file at rest.
    #[must_use]
    pub fn is_encrypted(&self) -> bool {
        self.key.is_some()
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("path", &self.path)
            .field("encrypted", &self.is_encrypted())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap as Map;

    fn record(id: &str) -> SessionRecord {
        SessionRecord {
            session_id: SessionId::new(id),
            user_id: format!("u-{id}"),
            email: format!("{id}@example.com"),
            credentials: Map::new(),
            profile: Map::new(),
            preferences: Map::new(),
            metadata: Map::new(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn upsert_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open(dir.path().join("sessions.json"), None)
            .await
            .unwrap();
        let r = record("s-1");
        store.upsert(r.clone()).await.unwrap();
        let fetched = store.get(&SessionId::new("s-1")).await.unwrap();
        assert_eq!(fetched.session_id, r.session_id);
        assert_eq!(fetched.user_id, r.user_id);
    }

    #[tokio::test]
    async fn delete_removes_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open(dir.path().join("sessions.json"), None)
            .await
            .unwrap();
        store.upsert(record("s-1")).await.unwrap();
        store.delete(&SessionId::new("s-1")).await.unwrap();
        assert!(store.get(&SessionId::new("s-1")).await.is_none());
    }

    #[tokio::test]
    async fn reload_sees_prior_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.json");
        {
            let store = SessionStore::open(&path, None).await.unwrap();
            store.upsert(record("s-1")).await.unwrap();
        }
        let reopened = SessionStore::open(&path, None).await.unwrap();
        assert_eq!(reopened.list().await.len(), 1);
    }

    #[tokio::test]
    async fn encrypted_round_trip_and_wrong_key_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.enc");
        let (key, encoded) = SessionKey::generate();
        {
            let store = SessionStore::open(&path, Some(key)).await.unwrap();
            store.upsert(record("s-1")).await.unwrap();
        }

        // Correct key reloads fine.
        let key_again = SessionKey::from_base64(&encoded).unwrap();
        let reopened = SessionStore::open(&path, Some(key_again)).await.unwrap();
        assert_eq!(reopened.list().await.len(), 1);

        // Wrong key fails loudly rather than silently using stale/empty data.
        let (wrong_key, _) = SessionKey::generate();
        let result = SessionStore::open(&path, Some(wrong_key)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn plaintext_file_never_contains_field_values_when_encrypted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.enc");
        let (key, _) = SessionKey::generate();
        let store = SessionStore::open(&path, Some(key)).await.unwrap();
        store.upsert(record("s-1")).await.unwrap();

        let raw = tokio::fs::read(&path).await.unwrap();
        let raw_str = String::from_utf8_lossy(&raw);
        assert!(!raw_str.contains("s-1"));
        assert!(!raw_str.contains("u-s-1"));
    }

    #[tokio::test]
    async fn invalid_record_shape_names_offending_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions.json");
        tokio::fs::write(&path, br#"[{"not_a_session_record": true}]"#)
            .await
            .unwrap();
        let err = SessionStore::open(&path, None).await.unwrap_err();
        match err {
            StoreError::InvalidRecord { index, .. } => assert_eq!(index, 0),
            other => panic!("expected InvalidRecord, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_file_on_first_run() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open(dir.path().join("sessions.json"), None)
            .await
            .unwrap();
        assert!(store.list().await.is_empty());
    }
}
