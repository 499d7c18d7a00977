//! Scope resolution: logical scope → stable on-disk partition id.
//!
//! A scope id is the SHA-256 hex digest of the normalized identifier, so
//! `https://host/org/repo`, `host/org/repo.git` and `git@host:org/repo.git`
//! all land in the same partition.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::ValidationError;

/// Length of a hex-encoded scope id.
pub const SCOPE_ID_LEN: usize = 64;

/// Partition family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeType {
    Project,
    User,
    Org,
}

impl ScopeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeType::Project => "project",
            ScopeType::User => "user",
            ScopeType::Org => "org",
        }
    }
}

impl fmt::Display for ScopeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScopeType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "project" => Ok(ScopeType::Project),
            "user" => Ok(ScopeType::User),
            "org" => Ok(ScopeType::Org),
            other => Err(ValidationError::InvalidScopeType(other.to_string())),
        }
    }
}

/// A resolved scope. The id is always 64 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    #[serde(rename = "type")]
    pub scope_type: ScopeType,
    pub id: String,
}

impl Scope {
    /// Resolve a raw identifier (repository URL, user name, org name).
    pub fn resolve(scope_type: ScopeType, identifier: &str) -> Self {
        Self {
            scope_type,
            id: scope_id(identifier),
        }
    }

    /// Build a scope from an already computed id.
    pub fn new(scope_type: ScopeType, id: &str) -> Result<Self, ValidationError> {
        validate_scope_id(id)?;
        Ok(Self {
            scope_type,
            id: id.to_string(),
        })
    }

    /// First 12 hex chars, for display.
    pub fn short_id(&self) -> &str {
        &self.id[..12.min(self.id.len())]
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.scope_type, self.short_id())
    }
}

/// Normalize a scope identifier.
///
/// Lowercases, strips a `scheme://` prefix, rewrites scp-style remotes
/// (`git@host:org/repo`) to `host/org/repo`, and strips trailing slashes and
/// a trailing `.git`. User-info is only dropped from URLs and scp remotes;
/// a bare `name@domain` keeps its local part.
pub fn normalize_identifier(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let mut s: &str = &lowered;

    let had_scheme = match s.find("://") {
        Some(idx) => {
            s = &s[idx + 3..];
            true
        }
        None => false,
    };

    let authority_end = s.find('/').unwrap_or(s.len());
    let authority = &s[..authority_end];
    let out = match authority.rfind('@') {
        // `scheme://user@host/path`
        Some(at) if had_scheme => s[at + 1..].to_string(),
        // scp-style `user@host:path`
        Some(at) if authority[at + 1..].contains(':') => {
            let rest = &s[at + 1..];
            rest.replacen(':', "/", 1)
        }
        // Bare `name@domain` is an identifier in its own right.
        _ => s.to_string(),
    };

    let trimmed = out.trim_end_matches('/');
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
    trimmed.trim_end_matches('/').to_string()
}

/// SHA-256 hex digest of the normalized identifier.
pub fn scope_id(identifier: &str) -> String {
    let normalized = normalize_identifier(identifier);
    hex::encode(Sha256::digest(normalized.as_bytes()))
}

pub fn validate_scope_id(id: &str) -> Result<(), ValidationError> {
    let ok = id.len() == SCOPE_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
    if ok {
        Ok(())
    } else {
        Err(ValidationError::InvalidScopeId(id.to_string()))
    }
}
