//! Deterministic conflict resolution.
//!
//! Given the ACTIVE records that share one conflict key, pick exactly one
//! winner. Criteria are applied in order until a single candidate remains:
//!
//! 1. highest evidence level (E2 > E1 > E0)
//! 2. most recent `created_at`
//! 3. lexicographically greatest id
//!
//! Ids are unique, so the order is total and repeated queries over unchanged
//! data always return the same winner. Resolution is read-only: deprecating
//! the losers is a separate caller action.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::ConflictResolutionError;
use crate::obs;
use crate::record::{MemoryRecord, RecordStatus};

/// Why the winner won.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionReason {
    OnlyMatch,
    HighestEvidence,
    MostRecent,
    GreatestId,
}

impl ResolutionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionReason::OnlyMatch => "only match",
            ResolutionReason::HighestEvidence => "highest evidence level",
            ResolutionReason::MostRecent => "most recent",
            ResolutionReason::GreatestId => "greatest id",
        }
    }
}

impl fmt::Display for ResolutionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ResolutionReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// The canonical answer for one conflict key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub conflict_key: String,
    pub winner: MemoryRecord,
    pub reason: ResolutionReason,
    /// All candidates, winner first, in descending precedence.
    pub candidates: Vec<MemoryRecord>,
}

impl Resolution {
    /// Candidates other than the winner.
    pub fn losers(&self) -> impl Iterator<Item = &MemoryRecord> {
        self.candidates.iter().filter(|c| c.id != self.winner.id)
    }
}

/// Total precedence order: greater wins.
pub fn precedence(a: &MemoryRecord, b: &MemoryRecord) -> Ordering {
    a.evidence_level
        .cmp(&b.evidence_level)
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Resolve one conflict set. Zero candidates yields `None`.
///
/// Candidates must be ACTIVE, share a conflict key and have distinct ids.
pub fn resolve(
    candidates: &[MemoryRecord],
) -> Result<Option<Resolution>, ConflictResolutionError> {
    let Some(first) = candidates.first() else {
        return Ok(None);
    };

    let mut seen = HashSet::with_capacity(candidates.len());
    for c in candidates {
        if c.conflict_key != first.conflict_key {
            return Err(ConflictResolutionError::MixedConflictKeys {
                expected: first.conflict_key.clone(),
                found: c.conflict_key.clone(),
            });
        }
        if c.status != RecordStatus::Active {
            return Err(ConflictResolutionError::InactiveCandidate {
                id: c.id.to_string(),
            });
        }
        if !seen.insert(&c.id) {
            return Err(ConflictResolutionError::DuplicateCandidate {
                id: c.id.to_string(),
            });
        }
    }

    let mut ordered: Vec<MemoryRecord> = candidates.to_vec();
    ordered.sort_by(|a, b| precedence(b, a));

    let reason = if ordered.len() == 1 {
        ResolutionReason::OnlyMatch
    } else {
        deciding_reason(&ordered[0], &ordered[1])
    };

    obs::emit_conflict_resolved(
        &first.conflict_key,
        ordered[0].id.as_str(),
        ordered.len(),
        reason.as_str(),
    );

    Ok(Some(Resolution {
        conflict_key: first.conflict_key.clone(),
        winner: ordered[0].clone(),
        reason,
        candidates: ordered,
    }))
}

/// The first criterion on which the winner beats the runner-up. Every other
/// candidate is at or below the runner-up, so this is also the criterion that
/// narrowed the field to one.
fn deciding_reason(winner: &MemoryRecord, runner_up: &MemoryRecord) -> ResolutionReason {
    if winner.evidence_level != runner_up.evidence_level {
        ResolutionReason::HighestEvidence
    } else if winner.created_at != runner_up.created_at {
        ResolutionReason::MostRecent
    } else {
        ResolutionReason::GreatestId
    }
}

/// Group ACTIVE records by conflict key and resolve each group.
///
/// Non-ACTIVE records are ignored. Output is ordered by conflict key.
pub fn resolve_all<'a, I>(records: I) -> Result<Vec<Resolution>, ConflictResolutionError>
where
    I: IntoIterator<Item = &'a MemoryRecord>,
{
    let mut groups: BTreeMap<&str, Vec<MemoryRecord>> = BTreeMap::new();
    for r in records.into_iter().filter(|r| r.is_active()) {
        groups.entry(r.conflict_key.as_str()).or_default().push(r.clone());
    }

    let mut out = Vec::with_capacity(groups.len());
    for group in groups.values() {
        if let Some(resolution) = resolve(group)? {
            out.push(resolution);
        }
    }
    Ok(out)
}
