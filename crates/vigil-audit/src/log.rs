//! Append-only JSON-lines audit sink.

use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};
use vigil_core::SessionId;

use crate::entry::AuditRecord;
use crate::error::{AuditError, AuditResult};

/// Append-only JSON-lines audit trail.
///
/// Writes are serialized through a mutex; the actual file append runs on
/// a blocking-pool thread via [`tokio::task::spawn_blocking`] so a slow
/// disk never stalls the caller's async task.
#[derive(Clone)]
pub struct AuditLog {
    path: Arc<PathBuf>,
    write_lock: Arc<Mutex<()>>,
}

impl AuditLog {
    /// Open (creating if absent) the audit log at `path`.
    pub async fn open(path: impl Into<PathBuf>) -> AuditResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| AuditError::Io {
                        path: parent.display().to_string(),
                        source,
                    })?;
            }
        }
        Ok(Self {
            path: Arc::new(path),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Append one structured entry.
    pub async fn log(
        &self,
        event: impl Into<String>,
        session_id: impl Into<SessionId>,
        payload: serde_json::Value,
    ) -> AuditResult<()> {
        let record = AuditRecord::new(event, session_id, payload);
        let line = serde_json::to_string(&record)
            .map_err(|e| AuditError::Serialization(e.to_string()))?;

        let guard = self.write_lock.lock().await;
        let path = Arc::clone(&self.path);
        let result = tokio::task::spawn_blocking(move || append_line(&path, &line))
            .await
            .map_err(|e| AuditError::Io {
                path: self.path.display().to_string(),
                source: std::io::Error::other(e),
            })?;
        drop(guard);

        debug!(event = %record.event, session_id = %record.session_id, "audit entry written");
        result
    }

    /// Path this log appends to, for diagnostics.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read back every well-formed line in the log.
    ///
    /// Tolerant of a truncated/partial last line, e.g. one left behind by
    /// a crash mid-write: such a line is skipped with a warning rather
    /// than failing the whole read.
    pub async fn read_all(&self) -> AuditResult<Vec<AuditRecord>> {
        let path = Arc::clone(&self.path);
        tokio::task::spawn_blocking(move || read_all_lines(&path))
            .await
            .map_err(|e| AuditError::Io {
                path: path.display().to_string(),
                source: std::io::Error::other(e),
            })?
    }
}

fn append_line(path: &Path, line: &str) -> AuditResult<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| AuditError::Io {
            path: path.display().to_string(),
            source,
        })?;
    writeln!(file, "{line}").map_err(|source| AuditError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn read_all_lines(path: &Path) -> AuditResult<Vec<AuditRecord>> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(AuditError::Io {
                path: path.display().to_string(),
                source,
            });
        }
    };

    let mut records = Vec::new();
    for (lineno, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<AuditRecord>(line) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!(line = lineno, error = %e, "skipping unparsable audit log line");
            }
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn appends_and_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::open(dir.path().join("audit.log")).await.unwrap();
        log.log(
            "booking_result",
            "s-1",
            serde_json::json!({"success": true}),
        )
        .await
        .unwrap();
        log.log(
            "booking_result",
            "s-2",
            serde_json::json!({"success": false}),
        )
        .await
        .unwrap();

        let records = log.read_all().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].event, "booking_result");
        assert_eq!(records[0].session_id, SessionId::new("s-1"));
    }

    #[tokio::test]
    async fn tolerates_truncated_last_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.log");
        let log = AuditLog::open(&path).await.unwrap();
        log.log("booking_result", "s-1", serde_json::json!({"ok": true}))
            .await
            .unwrap();

        // Simulate a crash mid-write: append a half-written JSON line.
        {
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            writeln!(file, "{{\"timestamp\":\"2024-01-0").unwrap();
        }

        let records = log.read_all().await.unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::open(dir.path().join("nope/audit.log"))
            .await
            .unwrap();
        assert!(log.read_all().await.unwrap().is_empty());
    }
}
