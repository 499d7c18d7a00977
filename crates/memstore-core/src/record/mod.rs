//! Memory records: the canonical unit of stored knowledge.
//!
//! - `MemoryRecord`: one fact, one file
//! - `RecordId`: `mem_<base36 millis>_<8 hex>`, immutable once assigned
//! - `EvidenceLevel`: E0 < E1 < E2, only ever increases
//! - `RecordStatus`: ACTIVE, DEPRECATED, QUARANTINED

pub mod lifecycle;
pub mod validate;

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::scope::Scope;

pub use lifecycle::{LifecycleState, Transition};
pub use validate::{MAX_CONTENT_BYTES, MAX_TOPIC_LEN};

const ID_PREFIX: &str = "mem_";
const ID_RANDOM_HEX_LEN: usize = 8;

/// Record identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(String);

impl RecordId {
    /// Generate a fresh id from the current time and 32 random bits.
    pub fn generate() -> Self {
        Self::generate_at(Utc::now())
    }

    pub fn generate_at(at: DateTime<Utc>) -> Self {
        let millis = at.timestamp_millis().max(0) as u64;
        let random: u32 = rand::thread_rng().gen();
        Self(format!("{ID_PREFIX}{}_{random:08x}", to_base36(millis)))
    }

    /// Validate an id string against the generated format.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidRecordId(raw.to_string());

        let rest = raw.strip_prefix(ID_PREFIX).ok_or_else(invalid)?;
        let (ts, random) = rest.split_once('_').ok_or_else(invalid)?;

        let ts_ok = !ts.is_empty()
            && ts
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase());
        let random_ok = random.len() == ID_RANDOM_HEX_LEN
            && random
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));

        if ts_ok && random_ok {
            Ok(Self(raw.to_string()))
        } else {
            Err(invalid())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RecordId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RecordId {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut buf = Vec::new();
    while n > 0 {
        buf.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    buf.reverse();
    String::from_utf8_lossy(&buf).into_owned()
}

/// Confidence tier of a fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EvidenceLevel {
    /// Unverified, captured.
    E0,
    /// Reviewed.
    E1,
    /// Promoted, authoritative.
    E2,
}

impl EvidenceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvidenceLevel::E0 => "E0",
            EvidenceLevel::E1 => "E1",
            EvidenceLevel::E2 => "E2",
        }
    }
}

impl fmt::Display for EvidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordStatus {
    Active,
    Deprecated,
    Quarantined,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Active => "ACTIVE",
            RecordStatus::Deprecated => "DEPRECATED",
            RecordStatus::Quarantined => "QUARANTINED",
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: RecordId,
    pub content: String,
    pub evidence_level: EvidenceLevel,
    pub status: RecordStatus,
    /// Set iff `status` is QUARANTINED; points at the preserved original.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quarantine_ref: Option<String>,
    pub scope: Scope,
    pub conflict_key: String,
    #[serde(default)]
    pub purpose_tags: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
}

impl MemoryRecord {
    /// A new ACTIVE record. Inputs are expected to be validated already.
    pub fn new(
        id: RecordId,
        scope: Scope,
        conflict_key: impl Into<String>,
        content: impl Into<String>,
        evidence_level: EvidenceLevel,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            content: content.into(),
            evidence_level,
            status: RecordStatus::Active,
            quarantine_ref: None,
            scope,
            conflict_key: conflict_key.into(),
            purpose_tags: BTreeSet::new(),
            created_at,
            sources: Vec::new(),
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.purpose_tags.insert(tag.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.sources.push(source.into());
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == RecordStatus::Active
    }

    pub fn lifecycle_state(&self) -> LifecycleState {
        LifecycleState {
            evidence: self.evidence_level,
            status: self.status,
        }
    }

    /// Structural invariants every persisted record must satisfy.
    pub fn check_invariants(&self) -> Result<(), String> {
        match (self.status, self.quarantine_ref.as_deref()) {
            (RecordStatus::Quarantined, None) => {
                Err("QUARANTINED record has no quarantine_ref".into())
            }
            (RecordStatus::Quarantined, Some(r)) if r.trim().is_empty() => {
                Err("QUARANTINED record has an empty quarantine_ref".into())
            }
            (RecordStatus::Active | RecordStatus::Deprecated, Some(_)) => {
                Err(format!("{} record carries a quarantine_ref", self.status))
            }
            _ => Ok(()),
        }
    }

    /// Canonical on-disk encoding: 2-space indented JSON plus trailing newline.
    pub fn to_json_bytes(&self) -> serde_json::Result<Vec<u8>> {
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}
