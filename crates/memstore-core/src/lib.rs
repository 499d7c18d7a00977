//! Memstore Core Library
//!
//! File-backed memory records for AI coding agents: validated capture,
//! evidence promotion, secret scanning, deterministic conflict resolution,
//! crash-safe locked storage and an append-only audit log.

pub mod audit;
pub mod config;
pub mod error;
pub mod git;
pub mod governance;
pub mod layout;
pub mod obs;
pub mod record;
pub mod resolver;
pub mod retry;
pub mod scan;
pub mod scope;
pub mod storage;
pub mod store;
pub mod telemetry;

pub use audit::{AuditEvent, AuditEventType, AuditLog};
pub use config::{SecretAction, StoreConfig};
pub use error::{
    ConflictResolutionError, MemstoreError, Result, SecurityError, StorageError, ValidationError,
};
pub use git::{detect_repo_identifier, project_identifier};
pub use governance::{AllowAllOwnership, ConstitutionDetector, GovernanceDetector, OwnershipReader};
pub use layout::StoreLayout;
pub use record::lifecycle::Promotion;
pub use record::{EvidenceLevel, MemoryRecord, RecordId, RecordStatus};
pub use resolver::{resolve, resolve_all, Resolution, ResolutionReason};
pub use retry::{with_retry, RetryPolicy, Retryable};
pub use scan::{
    mask_matches, mask_secret, Detector, PatternDetector, PatternEntry, ScanResult,
    SecretScanner, Severity, Tier,
};
pub use scope::{scope_id, Scope, ScopeType};
pub use storage::{write_atomic, write_locked};
pub use store::{
    CaptureOutcome, CaptureRequest, MemoryStore, PromoteRequest, QueryFilter, QueryResult,
    RecordListing,
};
pub use telemetry::init_tracing;

/// Memstore version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
