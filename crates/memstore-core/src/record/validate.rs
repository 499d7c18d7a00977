//! Field validation and normalization.
//!
//! Every function here is pure and runs before any disk access.

use std::collections::BTreeSet;

use super::{EvidenceLevel, RecordId};
use crate::error::ValidationError;

/// Maximum normalized topic length, in characters.
pub const MAX_TOPIC_LEN: usize = 200;

/// Maximum content size, in bytes (1 MiB).
pub const MAX_CONTENT_BYTES: usize = 1024 * 1024;

/// Normalize a topic into a conflict key.
///
/// Trims, lowercases and collapses each whitespace run into a single `.`:
/// `"  Pkg  Manager "` → `"pkg.manager"`.
pub fn normalize_topic(raw: &str) -> Result<String, ValidationError> {
    let normalized = raw
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(".");

    if normalized.is_empty() {
        return Err(ValidationError::EmptyTopic);
    }

    let len = normalized.chars().count();
    if len > MAX_TOPIC_LEN {
        return Err(ValidationError::TopicTooLong {
            len,
            max: MAX_TOPIC_LEN,
        });
    }

    Ok(normalized)
}

/// Reject empty (or whitespace-only) and oversized content.
pub fn validate_content(content: &str) -> Result<(), ValidationError> {
    if content.trim().is_empty() {
        return Err(ValidationError::EmptyContent);
    }
    if content.len() > MAX_CONTENT_BYTES {
        return Err(ValidationError::ContentTooLarge {
            size: content.len(),
            max: MAX_CONTENT_BYTES,
        });
    }
    Ok(())
}

/// Parse an evidence level. `E2` is only legal when `allow_e2` is set, which
/// only the promotion path does.
pub fn parse_evidence_level(raw: &str, allow_e2: bool) -> Result<EvidenceLevel, ValidationError> {
    let level = match raw.trim() {
        "E0" => EvidenceLevel::E0,
        "E1" => EvidenceLevel::E1,
        "E2" => EvidenceLevel::E2,
        other => return Err(ValidationError::InvalidEvidenceLevel(other.to_string())),
    };
    validate_evidence_level(level, allow_e2)
}

pub fn validate_evidence_level(
    level: EvidenceLevel,
    allow_e2: bool,
) -> Result<EvidenceLevel, ValidationError> {
    if level == EvidenceLevel::E2 && !allow_e2 {
        return Err(ValidationError::E2RequiresPromotion);
    }
    Ok(level)
}

pub fn validate_record_id(raw: &str) -> Result<RecordId, ValidationError> {
    RecordId::parse(raw.trim())
}

/// Audit justification: trimmed, non-empty.
pub fn validate_reason(reason: &str) -> Result<String, ValidationError> {
    let trimmed = reason.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingReason);
    }
    Ok(trimmed.to_string())
}

/// Trim tags and drop empties. Order and duplicates are irrelevant.
pub fn normalize_tags<I, S>(tags: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|t| t.as_ref().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}
