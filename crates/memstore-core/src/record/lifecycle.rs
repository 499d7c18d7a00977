//! Record lifecycle state machine.
//!
//! States are `{E0, E1, E2} × {ACTIVE, DEPRECATED, QUARANTINED}`. Legal moves:
//!
//! | transition | from                         | to                    |
//! |------------|------------------------------|-----------------------|
//! | Promote    | (E0 or E1, ACTIVE)           | (E2, ACTIVE)          |
//! | Deprecate  | (any, ACTIVE)                | (same, DEPRECATED)    |
//! | Quarantine | (any, ACTIVE or DEPRECATED)  | (same, QUARANTINED)   |
//!
//! QUARANTINED is terminal and evidence never decreases.

use super::validate::validate_reason;
use super::{EvidenceLevel, MemoryRecord, RecordStatus};
use crate::error::{Result, SecurityError, ValidationError};
use crate::scan::ScanResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LifecycleState {
    pub evidence: EvidenceLevel,
    pub status: RecordStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    Promote,
    Deprecate,
    Quarantine,
}

impl LifecycleState {
    /// The state reached by applying `transition`, or `None` if illegal.
    pub fn apply(self, transition: Transition) -> Option<LifecycleState> {
        use RecordStatus::*;
        match (transition, self.status) {
            (Transition::Promote, Active) if self.evidence < EvidenceLevel::E2 => {
                Some(LifecycleState {
                    evidence: EvidenceLevel::E2,
                    status: Active,
                })
            }
            (Transition::Deprecate, Active) => Some(LifecycleState {
                status: Deprecated,
                ..self
            }),
            (Transition::Quarantine, Active | Deprecated) => Some(LifecycleState {
                status: Quarantined,
                ..self
            }),
            _ => None,
        }
    }
}

/// Outcome of a successful promotion.
#[derive(Debug, Clone, PartialEq)]
pub struct Promotion {
    pub record: MemoryRecord,
    pub from: EvidenceLevel,
    pub reason: String,
    pub constitution_approved: bool,
    /// Non-blocking (YELLOW) scan finding on the promoted content.
    pub warning: Option<ScanResult>,
}

/// State preconditions of promotion: ACTIVE and not yet E2.
pub fn check_promotable(record: &MemoryRecord) -> std::result::Result<(), ValidationError> {
    if record.status != RecordStatus::Active {
        return Err(ValidationError::NotActive {
            id: record.id.to_string(),
            status: record.status.to_string(),
            action: "promoted",
        });
    }
    if record.evidence_level == EvidenceLevel::E2 {
        return Err(ValidationError::AlreadyPromoted {
            id: record.id.to_string(),
        });
    }
    Ok(())
}

/// Promote `record` to E2.
///
/// Checks, each a distinct failure: non-empty reason, ACTIVE, not already
/// E2, and explicit approval when the record draws on a governed file
/// (`governed_path`). Only `evidence_level` changes.
pub fn promote(
    record: &MemoryRecord,
    reason: &str,
    governed_path: Option<&str>,
    constitution_approved: bool,
) -> Result<Promotion> {
    let reason = validate_reason(reason)?;
    check_promotable(record)?;

    if let Some(path) = governed_path {
        if !constitution_approved {
            return Err(SecurityError::ConstitutionApprovalRequired {
                path: path.to_string(),
            }
            .into());
        }
    }

    let next = record
        .lifecycle_state()
        .apply(Transition::Promote)
        .ok_or_else(|| ValidationError::AlreadyPromoted {
            id: record.id.to_string(),
        })?;

    let mut promoted = record.clone();
    promoted.evidence_level = next.evidence;

    Ok(Promotion {
        record: promoted,
        from: record.evidence_level,
        reason,
        constitution_approved,
        warning: None,
    })
}

/// Mark an ACTIVE record DEPRECATED. Evidence is kept.
pub fn deprecate(record: &MemoryRecord, reason: &str) -> Result<MemoryRecord> {
    validate_reason(reason)?;

    let next = record
        .lifecycle_state()
        .apply(Transition::Deprecate)
        .ok_or_else(|| ValidationError::NotActive {
            id: record.id.to_string(),
            status: record.status.to_string(),
            action: "deprecated",
        })?;

    let mut deprecated = record.clone();
    deprecated.status = next.status;
    Ok(deprecated)
}

/// Placeholder stored in place of quarantined content.
pub fn quarantine_placeholder(quarantine_ref: &str) -> String {
    format!("[QUARANTINED] original content withheld, see {quarantine_ref}")
}

/// Force a record into QUARANTINED, replacing its content with a reference.
pub fn quarantine(record: &MemoryRecord, quarantine_ref: &str) -> Result<MemoryRecord> {
    let next = record
        .lifecycle_state()
        .apply(Transition::Quarantine)
        .ok_or_else(|| ValidationError::AlreadyQuarantined {
            id: record.id.to_string(),
        })?;

    let mut quarantined = record.clone();
    quarantined.status = next.status;
    quarantined.content = quarantine_placeholder(quarantine_ref);
    quarantined.quarantine_ref = Some(quarantine_ref.to_string());
    Ok(quarantined)
}
