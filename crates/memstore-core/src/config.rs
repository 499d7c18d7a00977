//! Store configuration (`<root>/config.json`).
//!
//! Every field is defaulted, so a missing file or a partial file both load.
//! Environment overrides are applied after the file:
//!
//! - `MEMSTORE_LOCK_TIMEOUT_MS`: lock acquisition timeout in milliseconds
//! - `MEMSTORE_SECRET_ACTION`: `block` or `quarantine`

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::retry::RetryPolicy;
use crate::storage::{write_atomic, StorageError, StorageResult, DEFAULT_LOCK_TIMEOUT_MS};

pub const CONFIG_SCHEMA_VERSION: u32 = 1;

pub const ENV_LOCK_TIMEOUT_MS: &str = "MEMSTORE_LOCK_TIMEOUT_MS";
pub const ENV_SECRET_ACTION: &str = "MEMSTORE_SECRET_ACTION";

/// What capture does with content that scans RED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretAction {
    /// Refuse the write with a security error.
    #[default]
    Block,
    /// Store the record QUARANTINED and preserve the original separately.
    Quarantine,
}

impl fmt::Display for SecretAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SecretAction::Block => "block",
            SecretAction::Quarantine => "quarantine",
        })
    }
}

impl FromStr for SecretAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "block" => Ok(SecretAction::Block),
            "quarantine" => Ok(SecretAction::Quarantine),
            other => Err(format!("unknown secret action: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub schema_version: u32,
    pub lock_timeout_ms: u64,
    pub retry: RetryPolicy,
    pub secret_action: SecretAction,
    /// Deprecate resolution losers automatically on query.
    pub deprecate_on_supersede: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            schema_version: CONFIG_SCHEMA_VERSION,
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
            retry: RetryPolicy::default(),
            secret_action: SecretAction::default(),
            deprecate_on_supersede: false,
        }
    }
}

impl StoreConfig {
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    /// Load from `path`. A missing file yields defaults; an unparseable one
    /// is reported as corrupted.
    pub async fn load(path: &Path) -> StorageResult<Self> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(StorageError::from_io(e, path)),
        };
        serde_json::from_slice(&bytes).map_err(|e| StorageError::corrupted(path, e.to_string()))
    }

    /// Load from `path`, then apply process environment overrides.
    pub async fn load_with_env(path: &Path) -> StorageResult<Self> {
        let mut config = Self::load(path).await?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from `lookup`. Invalid values are ignored with a warning.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_LOCK_TIMEOUT_MS) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => self.lock_timeout_ms = ms,
                Err(e) => warn!(
                    event = "config.override_ignored",
                    key = ENV_LOCK_TIMEOUT_MS,
                    value = %raw,
                    error = %e,
                ),
            }
        }

        if let Some(raw) = lookup(ENV_SECRET_ACTION) {
            match raw.parse::<SecretAction>() {
                Ok(action) => self.secret_action = action,
                Err(e) => warn!(
                    event = "config.override_ignored",
                    key = ENV_SECRET_ACTION,
                    value = %raw,
                    error = %e,
                ),
            }
        }
    }

    /// Write atomically as indented JSON.
    pub async fn save(&self, path: &Path) -> StorageResult<()> {
        let mut bytes = serde_json::to_vec_pretty(self)
            .map_err(|e| StorageError::corrupted(path, e.to_string()))?;
        bytes.push(b'\n');
        write_atomic(path, bytes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults() {
        let c = StoreConfig::default();
        assert_eq!(c.schema_version, 1);
        assert_eq!(c.lock_timeout_ms, 5_000);
        assert_eq!(c.secret_action, SecretAction::Block);
        assert!(!c.deprecate_on_supersede);
        assert_eq!(c.retry, RetryPolicy::default());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let c: StoreConfig =
            serde_json::from_str(r#"{"secret_action": "quarantine", "retry": {"max_attempts": 7}}"#)
                .unwrap();
        assert_eq!(c.secret_action, SecretAction::Quarantine);
        assert_eq!(c.retry.max_attempts, 7);
        assert_eq!(c.retry.initial_delay_ms, 100);
        assert_eq!(c.lock_timeout_ms, 5_000);
    }

    #[test]
    fn overrides_apply_and_bad_values_are_ignored() {
        let env: HashMap<&str, &str> = [
            (ENV_LOCK_TIMEOUT_MS, "250"),
            (ENV_SECRET_ACTION, "Quarantine"),
        ]
        .into();
        let mut c = StoreConfig::default();
        c.apply_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(c.lock_timeout(), Duration::from_millis(250));
        assert_eq!(c.secret_action, SecretAction::Quarantine);

        let bad: HashMap<&str, &str> =
            [(ENV_LOCK_TIMEOUT_MS, "soon"), (ENV_SECRET_ACTION, "shred")].into();
        let mut c = StoreConfig::default();
        c.apply_overrides(|k| bad.get(k).map(|v| v.to_string()));
        assert_eq!(c, StoreConfig::default());
    }

    #[tokio::test]
    async fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let c = StoreConfig::load(&dir.path().join("config.json")).await.unwrap();
        assert_eq!(c, StoreConfig::default());
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ nope").unwrap();
        let err = StoreConfig::load(&path).await.unwrap_err();
        assert!(matches!(err, StorageError::Corrupted { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let c = StoreConfig {
            lock_timeout_ms: 1_234,
            deprecate_on_supersede: true,
            ..StoreConfig::default()
        };
        c.save(&path).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n  \"lock_timeout_ms\": 1234"));
        assert_eq!(StoreConfig::load(&path).await.unwrap(), c);
    }
}
