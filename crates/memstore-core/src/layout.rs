//! On-disk layout of a store root.
//!
//! ```text
//! <root>/config.json
//! <root>/records/<scope-type>/<scope-id>/<record-id>.json
//! <root>/quarantined/<record-id>.original
//! <root>/audit/events.ndjson
//! ```
//!
//! Quarantined originals are global, not per scope.

use std::path::{Path, PathBuf};

use crate::record::RecordId;
use crate::scope::Scope;

pub const RECORDS_DIR: &str = "records";
pub const QUARANTINE_DIR: &str = "quarantined";
pub const AUDIT_DIR: &str = "audit";
pub const AUDIT_FILE: &str = "events.ndjson";
pub const CONFIG_FILE: &str = "config.json";
pub const RECORD_EXT: &str = "json";
pub const QUARANTINE_EXT: &str = "original";

/// Path calculator for one store root. Holds no other state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLayout {
    root: PathBuf,
}

impl StoreLayout {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn records_root(&self) -> PathBuf {
        self.root.join(RECORDS_DIR)
    }

    pub fn records_dir(&self, scope: &Scope) -> PathBuf {
        self.records_root()
            .join(scope.scope_type.as_str())
            .join(&scope.id)
    }

    pub fn record_path(&self, scope: &Scope, id: &RecordId) -> PathBuf {
        self.records_dir(scope)
            .join(format!("{}.{RECORD_EXT}", id.as_str()))
    }

    pub fn quarantine_dir(&self) -> PathBuf {
        self.root.join(QUARANTINE_DIR)
    }

    pub fn quarantine_path(&self, id: &RecordId) -> PathBuf {
        self.quarantine_dir()
            .join(format!("{}.{QUARANTINE_EXT}", id.as_str()))
    }

    /// Reference stored in `quarantine_ref`, relative to the root.
    pub fn quarantine_ref(&self, id: &RecordId) -> String {
        format!("{QUARANTINE_DIR}/{}.{QUARANTINE_EXT}", id.as_str())
    }

    pub fn audit_dir(&self) -> PathBuf {
        self.root.join(AUDIT_DIR)
    }

    pub fn audit_log_path(&self) -> PathBuf {
        self.audit_dir().join(AUDIT_FILE)
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }
}
