//! Append-only audit log.
//!
//! One JSON object per line in `audit/events.ndjson`. The log is never
//! rewritten or compacted. Each event is serialized up front and written
//! with a single `write_all` in append mode, so concurrent appenders do not
//! interleave within a line.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use crate::obs;
use crate::record::{EvidenceLevel, RecordId};
use crate::storage::{ensure_dir, StorageError, StorageResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEventType {
    Capture,
    Promote,
    Deprecate,
    Quarantine,
}

impl AuditEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditEventType::Capture => "CAPTURE",
            AuditEventType::Promote => "PROMOTE",
            AuditEventType::Deprecate => "DEPRECATE",
            AuditEventType::Quarantine => "QUARANTINE",
        }
    }
}

impl fmt::Display for AuditEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One audit line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_type: AuditEventType,
    pub record_id: RecordId,
    pub from_evidence: Option<EvidenceLevel>,
    pub to_evidence: Option<EvidenceLevel>,
    pub reason: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub constitution_approved: bool,
}

impl AuditEvent {
    fn base(event_type: AuditEventType, record_id: &RecordId) -> Self {
        Self {
            event_type,
            record_id: record_id.clone(),
            from_evidence: None,
            to_evidence: None,
            reason: None,
            timestamp: Utc::now(),
            constitution_approved: false,
        }
    }

    pub fn capture(record_id: &RecordId, level: EvidenceLevel) -> Self {
        Self {
            to_evidence: Some(level),
            ..Self::base(AuditEventType::Capture, record_id)
        }
    }

    pub fn promote(
        record_id: &RecordId,
        from: EvidenceLevel,
        reason: impl Into<String>,
        constitution_approved: bool,
    ) -> Self {
        Self {
            from_evidence: Some(from),
            to_evidence: Some(EvidenceLevel::E2),
            reason: Some(reason.into()),
            constitution_approved,
            ..Self::base(AuditEventType::Promote, record_id)
        }
    }

    pub fn deprecate(record_id: &RecordId, reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
            ..Self::base(AuditEventType::Deprecate, record_id)
        }
    }

    pub fn quarantine(record_id: &RecordId, reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
            ..Self::base(AuditEventType::Quarantine, record_id)
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Handle on one event log file.
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one event as a single line.
    pub async fn append(&self, event: &AuditEvent) -> StorageResult<()> {
        let mut line = serde_json::to_vec(event)
            .map_err(|e| StorageError::corrupted(&self.path, e.to_string()))?;
        line.push(b'\n');

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            ensure_dir(parent).await?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| StorageError::from_io(e, &self.path))?;

        file.write_all(&line)
            .await
            .map_err(|e| StorageError::from_io(e, &self.path))?;
        file.flush()
            .await
            .map_err(|e| StorageError::from_io(e, &self.path))
    }

    /// Append, downgrading failure to a warning. Used after a state change
    /// has already been committed.
    pub async fn append_or_warn(&self, event: &AuditEvent) -> bool {
        match self.append(event).await {
            Ok(()) => true,
            Err(e) => {
                obs::emit_audit_append_failed(event.record_id.as_str(), &e);
                false
            }
        }
    }

    /// Every parseable event, in file order. A missing log is empty;
    /// unparseable lines are skipped with a warning.
    pub async fn read_events(&self) -> StorageResult<Vec<AuditEvent>> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::from_io(e, &self.path)),
        };

        let mut events = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<AuditEvent>(line) {
                Ok(event) => events.push(event),
                Err(e) => tracing::warn!(
                    event = "audit.line_skipped",
                    path = %self.path.display(),
                    line = idx + 1,
                    error = %e,
                ),
            }
        }
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> RecordId {
        RecordId::parse("mem_lx2k9a_1f2e3d4c").unwrap()
    }

    #[test]
    fn event_json_shape() {
        let at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let event = AuditEvent::promote(&id(), EvidenceLevel::E0, "verified in CI", false)
            .with_timestamp(at);
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["event_type"], "PROMOTE");
        assert_eq!(json["record_id"], "mem_lx2k9a_1f2e3d4c");
        assert_eq!(json["from_evidence"], "E0");
        assert_eq!(json["to_evidence"], "E2");
        assert_eq!(json["reason"], "verified in CI");
        assert_eq!(json["constitution_approved"], false);
        assert_eq!(json["timestamp"], "2023-11-14T22:13:20Z");
    }

    #[test]
    fn nullable_fields_serialize_as_null() {
        let json = serde_json::to_value(AuditEvent::deprecate(&id(), "old")).unwrap();
        assert!(json["from_evidence"].is_null());
        assert!(json["to_evidence"].is_null());
    }

    #[tokio::test]
    async fn append_writes_one_line_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path().join("audit").join("events.ndjson"));

        log.append(&AuditEvent::capture(&id(), EvidenceLevel::E0))
            .await
            .unwrap();
        log.append(&AuditEvent::promote(&id(), EvidenceLevel::E0, "ok", true))
            .await
            .unwrap();

        let text = std::fs::read_to_string(log.path()).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.ends_with('\n'));

        let events = log.read_events().await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, AuditEventType::Capture);
        assert_eq!(events[1].event_type, AuditEventType::Promote);
        assert!(events[1].constitution_approved);
    }

    #[tokio::test]
    async fn missing_log_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path().join("none.ndjson"));
        assert!(log.read_events().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn corrupt_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let log = AuditLog::new(dir.path().join("events.ndjson"));
        log.append(&AuditEvent::capture(&id(), EvidenceLevel::E1))
            .await
            .unwrap();

        let mut text = std::fs::read_to_string(log.path()).unwrap();
        text.push_str("{not json\n");
        std::fs::write(log.path(), text).unwrap();
        log.append(&AuditEvent::deprecate(&id(), "gone"))
            .await
            .unwrap();

        let events = log.read_events().await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].event_type, AuditEventType::Deprecate);
    }

    #[tokio::test]
    async fn append_failure_is_downgraded() {
        let dir = tempfile::tempdir().unwrap();
        // The log path is a directory, so opening it for append fails.
        let log = AuditLog::new(dir.path());
        assert!(!log.append_or_warn(&AuditEvent::capture(&id(), EvidenceLevel::E0)).await);
    }
}
