//! The memory store service.
//!
//! [`MemoryStore`] wires validation, the secret-scan gate, the lifecycle
//! state machine, conflict resolution, locked/retried storage and the audit
//! log into the operations agents call. It holds no cached record state:
//! every operation reads what it needs from disk under an explicit root.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, Instrument};

use crate::audit::{AuditEvent, AuditLog};
use crate::config::{SecretAction, StoreConfig};
use crate::error::{MemstoreError, Result, SecurityError, StorageError};
use crate::governance::{AllowAllOwnership, ConstitutionDetector, GovernanceDetector, OwnershipReader};
use crate::layout::{StoreLayout, RECORD_EXT};
use crate::obs;
use crate::record::lifecycle::{self, Promotion};
use crate::record::validate::{
    normalize_tags, normalize_topic, validate_content, validate_evidence_level, validate_reason,
    validate_record_id,
};
use crate::record::{EvidenceLevel, MemoryRecord, RecordId, RecordStatus};
use crate::resolver::{precedence, resolve_all, Resolution};
use crate::retry::with_retry;
use crate::scan::{ScanResult, SecretScanner, Tier};
use crate::scope::Scope;
use crate::storage::{acquire_lock, ensure_dir, read_file, write_atomic, write_locked};

/// Input to [`MemoryStore::capture`].
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureRequest {
    pub topic: String,
    pub content: String,
    pub evidence_level: EvidenceLevel,
    pub purpose_tags: Vec<String>,
    pub sources: Vec<String>,
}

impl CaptureRequest {
    pub fn new(topic: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            content: content.into(),
            evidence_level: EvidenceLevel::E0,
            purpose_tags: Vec::new(),
            sources: Vec::new(),
        }
    }

    pub fn with_evidence(mut self, level: EvidenceLevel) -> Self {
        self.evidence_level = level;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.purpose_tags.push(tag.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.sources.push(source.into());
        self
    }
}

/// Result of a capture. `scan` is GREEN, YELLOW (stored with a warning) or
/// RED when the record was quarantined instead of refused.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptureOutcome {
    pub record: MemoryRecord,
    pub scan: ScanResult,
}

impl CaptureOutcome {
    pub fn is_quarantined(&self) -> bool {
        self.record.status == RecordStatus::Quarantined
    }

    /// The non-blocking finding, if the content scanned YELLOW.
    pub fn warning(&self) -> Option<&ScanResult> {
        (self.scan.tier() == Tier::Yellow).then_some(&self.scan)
    }
}

/// Every readable record of a scope, plus the files that could not be read.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecordListing {
    pub records: Vec<MemoryRecord>,
    pub skipped: Vec<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryFilter {
    /// Raw topic; normalized before matching against conflict keys.
    pub topic: Option<String>,
    pub purpose_tag: Option<String>,
    /// Include DEPRECATED records in `records` (history view).
    pub include_deprecated: bool,
}

impl QueryFilter {
    pub fn topic(topic: impl Into<String>) -> Self {
        Self {
            topic: Some(topic.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResult {
    /// Matching records, grouped by conflict key, best first.
    pub records: Vec<MemoryRecord>,
    /// One resolution per conflict key among the ACTIVE matches.
    pub resolutions: Vec<Resolution>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<PathBuf>,
}

/// Input to [`MemoryStore::promote`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromoteRequest {
    pub id: String,
    pub reason: String,
    pub constitution_approved: bool,
    /// When set, must be allowed to edit every governed source.
    pub actor: Option<String>,
}

impl PromoteRequest {
    pub fn new(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            reason: reason.into(),
            constitution_approved: false,
            actor: None,
        }
    }

    pub fn approved(mut self) -> Self {
        self.constitution_approved = true;
        self
    }

    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }
}

/// File-backed memory record store rooted at one directory.
pub struct MemoryStore {
    layout: StoreLayout,
    config: StoreConfig,
    scanner: SecretScanner,
    governance: Box<dyn GovernanceDetector>,
    ownership: Box<dyn OwnershipReader>,
    project_root: Option<PathBuf>,
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("root", &self.layout.root())
            .field("config", &self.config)
            .field("scanner", &self.scanner)
            .finish_non_exhaustive()
    }
}

impl MemoryStore {
    /// A store over `root` with an explicit config. Touches no files.
    pub fn new(root: impl AsRef<Path>, config: StoreConfig) -> Self {
        Self {
            layout: StoreLayout::new(root),
            config,
            scanner: SecretScanner::builtin(),
            governance: Box::new(ConstitutionDetector::new()),
            ownership: Box::new(AllowAllOwnership),
            project_root: None,
        }
    }

    /// Open `root`, loading `config.json` and environment overrides.
    pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
        let layout = StoreLayout::new(root.as_ref());
        let config = StoreConfig::load_with_env(&layout.config_path()).await?;
        Ok(Self::new(root, config))
    }

    /// Create the store directories and a default config, then open.
    ///
    /// Idempotent: existing directories are fine and an existing
    /// `config.json` is never overwritten.
    pub async fn init(root: impl AsRef<Path>) -> Result<Self> {
        let layout = StoreLayout::new(root.as_ref());
        ensure_dir(layout.root()).await?;
        ensure_dir(&layout.records_root()).await?;
        ensure_dir(&layout.quarantine_dir()).await?;
        ensure_dir(&layout.audit_dir()).await?;

        let config_path = layout.config_path();
        let exists = tokio::fs::try_exists(&config_path)
            .await
            .map_err(|e| StorageError::from_io(e, &config_path))?;
        if !exists {
            StoreConfig::default().save(&config_path).await?;
            info!(event = "store.initialized", root = %layout.root().display());
        } else {
            debug!(event = "store.already_initialized", root = %layout.root().display());
        }

        Self::open(root).await
    }

    pub fn with_config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_scanner(mut self, scanner: SecretScanner) -> Self {
        self.scanner = scanner;
        self
    }

    pub fn with_governance(mut self, detector: impl GovernanceDetector + 'static) -> Self {
        self.governance = Box::new(detector);
        self
    }

    pub fn with_ownership(mut self, reader: impl OwnershipReader + 'static) -> Self {
        self.ownership = Box::new(reader);
        self
    }

    /// Directory searched for governing files. Defaults to the parent of the
    /// store root.
    pub fn with_project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = Some(root.into());
        self
    }

    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn scanner(&self) -> &SecretScanner {
        &self.scanner
    }

    pub fn audit_log(&self) -> AuditLog {
        AuditLog::new(self.layout.audit_log_path())
    }

    fn project_root(&self) -> Option<&Path> {
        self.project_root
            .as_deref()
            .or_else(|| self.layout.root().parent())
    }

    // ---- operations -------------------------------------------------------

    /// Validate, scan and store a new record.
    pub async fn capture(&self, scope: &Scope, req: CaptureRequest) -> Result<CaptureOutcome> {
        let conflict_key = normalize_topic(&req.topic)?;
        validate_content(&req.content)?;
        let level = validate_evidence_level(req.evidence_level, false)?;

        let scan = self.scanner.scan(&req.content);

        let id = RecordId::generate();
        let mut record = MemoryRecord::new(
            id.clone(),
            scope.clone(),
            conflict_key,
            req.content,
            level,
            Utc::now(),
        );
        record.purpose_tags = normalize_tags(req.purpose_tags);
        record.sources = req
            .sources
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let span = obs::record_span(id.as_str(), "capture");
        async move {
            match scan.tier() {
                Tier::Red => match self.config.secret_action {
                    SecretAction::Block => Err(secret_detected(&scan).into()),
                    SecretAction::Quarantine => self.capture_quarantined(record, scan).await,
                },
                Tier::Yellow => {
                    obs::emit_secret_warning(
                        scan.pattern_name.as_deref().unwrap_or("unknown"),
                        scan.preview.as_deref().unwrap_or(crate::scan::FULL_MASK),
                    );
                    self.capture_active(record, scan).await
                }
                Tier::Green => self.capture_active(record, scan).await,
            }
        }
        .instrument(span)
        .await
    }

    async fn capture_active(&self, record: MemoryRecord, scan: ScanResult) -> Result<CaptureOutcome> {
        self.write_record(&record).await?;
        obs::emit_record_captured(
            record.id.as_str(),
            &record.scope.to_string(),
            &record.conflict_key,
            record.evidence_level.as_str(),
        );
        self.audit_log()
            .append_or_warn(&AuditEvent::capture(&record.id, record.evidence_level))
            .await;
        Ok(CaptureOutcome { record, scan })
    }

    // The original is persisted before the placeholder record exists, so a
    // crash in between leaves an orphaned original, never a dangling ref.
    async fn capture_quarantined(
        &self,
        record: MemoryRecord,
        scan: ScanResult,
    ) -> Result<CaptureOutcome> {
        let quarantine_ref = self.layout.quarantine_ref(&record.id);
        let quarantined = lifecycle::quarantine(&record, &quarantine_ref)?;

        self.persist(
            &self.layout.quarantine_path(&record.id),
            record.content.into_bytes(),
            "write_quarantine",
        )
        .await?;
        self.write_record(&quarantined).await?;

        obs::emit_record_quarantined(quarantined.id.as_str(), scan.pattern_name.as_deref());
        let reason = format!(
            "secret detected at capture: {}",
            scan.pattern_name.as_deref().unwrap_or("unknown")
        );
        self.audit_log()
            .append_or_warn(&AuditEvent::quarantine(&quarantined.id, reason))
            .await;

        Ok(CaptureOutcome {
            record: quarantined,
            scan,
        })
    }

    /// Load one record. The id is validated before any disk access.
    pub async fn get(&self, scope: &Scope, id: &str) -> Result<MemoryRecord> {
        let id = validate_record_id(id)?;
        let path = self.layout.record_path(scope, &id);
        match self.load_record(&path, scope).await {
            Err(MemstoreError::Storage(StorageError::NotFound { .. })) => {
                Err(MemstoreError::RecordNotFound(id.to_string()))
            }
            other => other,
        }
    }

    /// Every readable record in `scope`, any status, ordered by file name.
    ///
    /// Unreadable or corrupt files are skipped with a warning; records may be
    /// added or removed concurrently, so a listing is not a snapshot.
    pub async fn list(&self, scope: &Scope) -> Result<RecordListing> {
        let dir = self.layout.records_dir(scope);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(RecordListing::default())
            }
            Err(e) => return Err(StorageError::from_io(e, &dir).into()),
        };

        let mut paths = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::from_io(e, &dir))?
        {
            let path = entry.path();
            let is_record = path.extension().is_some_and(|ext| ext == RECORD_EXT)
                && !path
                    .file_name()
                    .is_some_and(|n| n.to_string_lossy().starts_with('.'));
            if is_record {
                paths.push(path);
            }
        }
        paths.sort();

        let mut listing = RecordListing::default();
        for path in paths {
            match self.load_record(&path, scope).await {
                Ok(record) => listing.records.push(record),
                Err(e) => {
                    obs::emit_record_skipped(&path.display().to_string(), &e);
                    listing.skipped.push(path);
                }
            }
        }
        Ok(listing)
    }

    /// Query a scope. QUARANTINED records are never returned; DEPRECATED
    /// ones only with `include_deprecated`, and never as a resolution.
    pub async fn query(&self, scope: &Scope, filter: &QueryFilter) -> Result<QueryResult> {
        let topic_key = filter.topic.as_deref().map(normalize_topic).transpose()?;
        let tag = filter
            .purpose_tag
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty());

        let listing = self.list(scope).await?;

        let mut records: Vec<MemoryRecord> = listing
            .records
            .into_iter()
            .filter(|r| match r.status {
                RecordStatus::Active => true,
                RecordStatus::Deprecated => filter.include_deprecated,
                RecordStatus::Quarantined => false,
            })
            .filter(|r| topic_key.as_deref().map_or(true, |k| r.conflict_key == k))
            .filter(|r| tag.map_or(true, |t| r.purpose_tags.contains(t)))
            .collect();

        records.sort_by(|a, b| {
            a.conflict_key
                .cmp(&b.conflict_key)
                .then_with(|| precedence(b, a))
        });

        let resolutions = resolve_all(&records)?;

        Ok(QueryResult {
            records,
            resolutions,
            skipped: listing.skipped,
        })
    }

    /// Promote a record to E2.
    ///
    /// Checked in order: reason, id, existence, ACTIVE, not already E2,
    /// content scan, governance approval, ownership. Everything after the id
    /// check runs under the record's lock. Nothing is written unless every
    /// check passes.
    pub async fn promote(&self, scope: &Scope, req: PromoteRequest) -> Result<Promotion> {
        let span = obs::record_span(req.id.trim(), "promote");
        self.promote_inner(scope, req).instrument(span).await
    }

    async fn promote_inner(&self, scope: &Scope, req: PromoteRequest) -> Result<Promotion> {
        let reason = validate_reason(&req.reason)?;
        let id = validate_record_id(&req.id)?;

        let promotion = self
            .rewrite(scope, &id, "promote_record", |record| {
                lifecycle::check_promotable(&record)?;

                let scan = self.scanner.scan(&record.content);
                if scan.is_blocking() {
                    return Err(secret_detected(&scan).into());
                }

                let governed = self.governed_sources(&record);
                let mut promotion = lifecycle::promote(
                    &record,
                    &reason,
                    governed.first().map(String::as_str),
                    req.constitution_approved,
                )?;

                if let Some(actor) = req.actor.as_deref() {
                    for path in &governed {
                        if !self.ownership.can_edit(Path::new(path), actor) {
                            return Err(SecurityError::EditNotPermitted {
                                path: path.clone(),
                                actor: actor.to_string(),
                            }
                            .into());
                        }
                    }
                }

                if scan.tier() == Tier::Yellow {
                    promotion.warning = Some(scan);
                }
                Ok(Rewrite::replace(promotion.record.clone(), promotion))
            })
            .await?;

        if let Some(warning) = &promotion.warning {
            obs::emit_secret_warning(
                warning.pattern_name.as_deref().unwrap_or("unknown"),
                warning.preview.as_deref().unwrap_or(crate::scan::FULL_MASK),
            );
        }
        obs::emit_record_promoted(
            promotion.record.id.as_str(),
            promotion.from.as_str(),
            promotion.record.evidence_level.as_str(),
            promotion.constitution_approved,
        );
        self.audit_log()
            .append_or_warn(&AuditEvent::promote(
                &promotion.record.id,
                promotion.from,
                promotion.reason.clone(),
                promotion.constitution_approved,
            ))
            .await;

        Ok(promotion)
    }

    /// ACTIVE → DEPRECATED. Evidence is kept.
    pub async fn deprecate(&self, scope: &Scope, id: &str, reason: &str) -> Result<MemoryRecord> {
        let reason = validate_reason(reason)?;
        let id = validate_record_id(id)?;
        let span = obs::record_span(id.as_str(), "deprecate");

        async {
            let deprecated = self
                .rewrite(scope, &id, "deprecate_record", |record| {
                    let deprecated = lifecycle::deprecate(&record, &reason)?;
                    Ok(Rewrite::replace(deprecated.clone(), deprecated))
                })
                .await?;
            self.record_deprecated(&deprecated.id, &reason).await;
            Ok(deprecated)
        }
        .instrument(span)
        .await
    }

    /// Deprecate every loser of `resolution`. Losers that are no longer
    /// ACTIVE on disk are left alone. Returns the ids actually deprecated.
    pub async fn supersede(
        &self,
        scope: &Scope,
        resolution: &Resolution,
        reason: &str,
    ) -> Result<Vec<RecordId>> {
        let reason = validate_reason(reason)?;
        let mut deprecated = Vec::new();
        for loser in resolution.losers() {
            let span = obs::record_span(loser.id.as_str(), "supersede");
            let changed = self
                .rewrite(scope, &loser.id, "supersede_record", |current| {
                    if !current.is_active() {
                        debug!(
                            event = "supersede.skip_inactive",
                            record_id = %current.id,
                            status = %current.status,
                        );
                        return Ok(Rewrite::unchanged(false));
                    }
                    Ok(Rewrite::replace(lifecycle::deprecate(&current, &reason)?, true))
                })
                .instrument(span)
                .await?;
            if changed {
                self.record_deprecated(&loser.id, &reason).await;
                deprecated.push(loser.id.clone());
            }
        }
        Ok(deprecated)
    }

    /// Force a stored record into QUARANTINED. The original content is
    /// preserved under `quarantined/` before the record is rewritten.
    pub async fn quarantine(&self, scope: &Scope, id: &str, reason: &str) -> Result<MemoryRecord> {
        let reason = validate_reason(reason)?;
        let id = validate_record_id(id)?;
        let span = obs::record_span(id.as_str(), "quarantine");

        async {
            let quarantined = self
                .rewrite(scope, &id, "quarantine_record", |record| {
                    let quarantine_ref = self.layout.quarantine_ref(&record.id);
                    let quarantined = lifecycle::quarantine(&record, &quarantine_ref)?;
                    Ok(Rewrite::replace(quarantined.clone(), quarantined)
                        .with_side_file(
                            self.layout.quarantine_path(&record.id),
                            record.content.into_bytes(),
                        ))
                })
                .await?;

            obs::emit_record_quarantined(quarantined.id.as_str(), None);
            self.audit_log()
                .append_or_warn(&AuditEvent::quarantine(&quarantined.id, reason.as_str()))
                .await;
            Ok(quarantined)
        }
        .instrument(span)
        .await
    }

    /// The full audit trail, oldest first.
    pub async fn audit_events(&self) -> Result<Vec<AuditEvent>> {
        Ok(self.audit_log().read_events().await?)
    }

    // ---- internals --------------------------------------------------------

    fn governed_sources(&self, record: &MemoryRecord) -> Vec<String> {
        let governing_file = self
            .project_root()
            .and_then(|root| self.governance.find_governing_file(root));

        record
            .sources
            .iter()
            .filter(|source| {
                let path = Path::new(source.as_str());
                self.governance.is_governed(path)
                    || match (&governing_file, self.project_root()) {
                        (Some(file), Some(root)) => root.join(path) == *file,
                        _ => false,
                    }
            })
            .cloned()
            .collect()
    }

    async fn write_record(&self, record: &MemoryRecord) -> Result<()> {
        let path = self.layout.record_path(&record.scope, &record.id);
        record
            .check_invariants()
            .map_err(|reason| StorageError::corrupted(&path, reason))?;
        let bytes = record.to_json_bytes()?;
        self.persist(&path, bytes, "write_record").await
    }

    /// Locked atomic write, retried on transient failures.
    async fn persist(&self, path: &Path, bytes: Vec<u8>, op: &str) -> Result<()> {
        let timeout = self.config.lock_timeout();
        with_retry(&self.config.retry, op, || {
            write_locked(path, bytes.clone(), timeout)
        })
        .await?;
        Ok(())
    }

    async fn record_deprecated(&self, id: &RecordId, reason: &str) {
        obs::emit_record_deprecated(id.as_str(), reason);
        self.audit_log()
            .append_or_warn(&AuditEvent::deprecate(id, reason))
            .await;
    }

    /// Read-modify-write of one stored record under its lock.
    ///
    /// `change` sees the record as it is on disk once the lock is held, so
    /// its state checks cannot race another writer. The whole unit is
    /// retried on transient failures.
    async fn rewrite<T, F>(&self, scope: &Scope, id: &RecordId, op: &str, change: F) -> Result<T>
    where
        F: Fn(MemoryRecord) -> Result<Rewrite<T>>,
    {
        let change = &change;
        with_retry(&self.config.retry, op, move || {
            self.rewrite_once(scope, id, change)
        })
        .await
    }

    async fn rewrite_once<T, F>(&self, scope: &Scope, id: &RecordId, change: &F) -> Result<T>
    where
        F: Fn(MemoryRecord) -> Result<Rewrite<T>>,
    {
        let path = self.layout.record_path(scope, id);
        // Checked before locking so a missing record leaves no lock file.
        let exists = tokio::fs::try_exists(&path)
            .await
            .map_err(|e| StorageError::from_io(e, &path))?;
        if !exists {
            return Err(MemstoreError::RecordNotFound(id.to_string()));
        }

        let timeout = self.config.lock_timeout();
        let _guard = acquire_lock(&path, timeout).await?;

        let current = match read_file(&path).await {
            Ok(bytes) => parse_record(&path, scope, &bytes)?,
            Err(StorageError::NotFound { .. }) => {
                return Err(MemstoreError::RecordNotFound(id.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        let Rewrite {
            record,
            side_file,
            value,
        } = change(current)?;

        if let Some(record) = record {
            record
                .check_invariants()
                .map_err(|reason| StorageError::corrupted(&path, reason))?;
            let bytes = record.to_json_bytes()?;
            if let Some((side_path, side_bytes)) = side_file {
                write_locked(&side_path, side_bytes, timeout).await?;
            }
            write_atomic(&path, bytes).await?;
        }
        Ok(value)
    }

    async fn load_record(&self, path: &Path, scope: &Scope) -> Result<MemoryRecord> {
        let bytes = with_retry(&self.config.retry, "read_record", || read_file(path)).await?;
        parse_record(path, scope, &bytes)
    }
}

/// Outcome of one locked read-modify-write step.
struct Rewrite<T> {
    record: Option<MemoryRecord>,
    /// Written before the record, e.g. a quarantined original.
    side_file: Option<(PathBuf, Vec<u8>)>,
    value: T,
}

impl<T> Rewrite<T> {
    fn replace(record: MemoryRecord, value: T) -> Self {
        Self {
            record: Some(record),
            side_file: None,
            value,
        }
    }

    fn unchanged(value: T) -> Self {
        Self {
            record: None,
            side_file: None,
            value,
        }
    }

    fn with_side_file(mut self, path: PathBuf, bytes: Vec<u8>) -> Self {
        self.side_file = Some((path, bytes));
        self
    }
}

fn parse_record(path: &Path, scope: &Scope, bytes: &[u8]) -> Result<MemoryRecord> {
    let record: MemoryRecord = serde_json::from_slice(bytes)
        .map_err(|e| StorageError::corrupted(path, e.to_string()))?;

    let expected_name = format!("{}.{RECORD_EXT}", record.id.as_str());
    if path.file_name().is_some_and(|n| n != expected_name.as_str()) {
        return Err(StorageError::corrupted(path, "record id does not match file name").into());
    }
    if record.scope != *scope {
        return Err(StorageError::corrupted(path, "record scope does not match partition").into());
    }
    record
        .check_invariants()
        .map_err(|reason| StorageError::corrupted(path, reason))?;
    Ok(record)
}

fn secret_detected(scan: &ScanResult) -> SecurityError {
    SecurityError::SecretDetected {
        pattern_id: scan.pattern_id.clone().unwrap_or_default(),
        pattern_name: scan.pattern_name.clone().unwrap_or_default(),
        remediation: scan.remediation.clone(),
    }
}
