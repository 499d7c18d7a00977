//! Error taxonomy for memstore.
//!
//! Each layer owns a narrow error enum; [`MemstoreError`] wraps them so the
//! store service and the CLI can propagate with `?`.

pub use crate::storage::StorageError;

/// Bad input shape or illegal state transition. Never retried.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("topic must not be empty")]
    EmptyTopic,

    #[error("topic is {len} characters, maximum is {max}")]
    TopicTooLong { len: usize, max: usize },

    #[error("content must not be empty")]
    EmptyContent,

    #[error("content is {size} bytes, maximum is {max}")]
    ContentTooLarge { size: usize, max: usize },

    #[error("invalid evidence level: {0} (expected E0, E1 or E2)")]
    InvalidEvidenceLevel(String),

    #[error("evidence level E2 can only be reached through promotion")]
    E2RequiresPromotion,

    #[error("invalid record id: {0}")]
    InvalidRecordId(String),

    #[error("invalid scope id: {0}")]
    InvalidScopeId(String),

    #[error("invalid scope type: {0} (expected project, user or org)")]
    InvalidScopeType(String),

    #[error("a non-empty reason is required")]
    MissingReason,

    #[error("record {id} is {status}, only ACTIVE records can be {action}")]
    NotActive {
        id: String,
        status: String,
        action: &'static str,
    },

    #[error("record {id} is already E2")]
    AlreadyPromoted { id: String },

    #[error("record {id} is already QUARANTINED")]
    AlreadyQuarantined { id: String },

    #[error("invalid detector pattern {id}: {reason}")]
    InvalidPattern { id: String, reason: String },
}

/// Blocking security findings. Always fatal to the operation.
#[derive(Debug, thiserror::Error)]
pub enum SecurityError {
    #[error("secret detected: {pattern_name} ({pattern_id})")]
    SecretDetected {
        pattern_id: String,
        pattern_name: String,
        remediation: Option<String>,
    },

    #[error("record references governed file {path}; promotion requires explicit constitution approval")]
    ConstitutionApprovalRequired { path: String },

    #[error("{actor} is not permitted to edit governed file {path}")]
    EditNotPermitted { path: String, actor: String },
}

/// The candidate set handed to the resolver was malformed.
#[derive(Debug, thiserror::Error)]
pub enum ConflictResolutionError {
    #[error("candidates span multiple conflict keys: {expected} and {found}")]
    MixedConflictKeys { expected: String, found: String },

    #[error("candidate {id} is not ACTIVE")]
    InactiveCandidate { id: String },

    #[error("duplicate candidate id {id}")]
    DuplicateCandidate { id: String },
}

/// Top-level memstore errors.
#[derive(Debug, thiserror::Error)]
pub enum MemstoreError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("security error: {0}")]
    Security(#[from] SecurityError),

    #[error("conflict resolution error: {0}")]
    ConflictResolution(#[from] ConflictResolutionError),

    #[error("record not found: {0}")]
    RecordNotFound(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MemstoreError {
    /// Stable label used in user-facing error lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Storage(_) => "storage",
            Self::Security(_) => "security",
            Self::ConflictResolution(_) => "conflict",
            Self::RecordNotFound(_) => "not_found",
            Self::Serialization(_) => "serialization",
        }
    }

    /// Process exit code for CLI-facing callers.
    pub fn exit_code(&self) -> i32 {
        1
    }

    /// Human-readable message; storage failures are rendered from their
    /// classified cause rather than raw OS text.
    pub fn user_message(&self) -> String {
        match self {
            Self::Storage(e) => e.user_message(),
            other => other.to_string(),
        }
    }

    pub fn is_security(&self) -> bool {
        matches!(self, Self::Security(_))
    }
}

/// Result type for memstore operations.
pub type Result<T> = std::result::Result<T, MemstoreError>;
