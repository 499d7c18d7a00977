//! Crash-safe single-file storage.
//!
//! - [`atomic`]: temp-file + rename writes, so readers only ever observe the
//!   complete old or complete new content.
//! - [`lock`]: advisory exclusive locks scoped to one target path.
//!
//! All I/O failures are classified into [`StorageError`] so the retry layer
//! can tell transient conditions from permanent ones.

pub mod atomic;
pub mod lock;

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use atomic::{ensure_dir, read_file, stage, write_atomic, StagedWrite};
pub use lock::{acquire_lock, write_locked, PathLock, DEFAULT_LOCK_TIMEOUT_MS};

/// Errors from storage operations, classified by cause.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("permission denied: {}", path.display())]
    PermissionDenied { path: PathBuf },

    #[error("disk full while writing {}", path.display())]
    DiskFull { path: PathBuf },

    #[error("resource busy: {}: {detail}", path.display())]
    Busy { path: PathBuf, detail: String },

    #[error("too many open files while accessing {}", path.display())]
    TooManyOpenFiles { path: PathBuf },

    #[error("resource temporarily unavailable: {}", path.display())]
    WouldBlock { path: PathBuf },

    #[error("timed out accessing {}", path.display())]
    TimedOut { path: PathBuf },

    #[error("corrupted content in {}: {reason}", path.display())]
    Corrupted { path: PathBuf, reason: String },

    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result type for storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

#[cfg(unix)]
mod os_codes {
    pub const DISK_FULL: &[i32] = &[28]; // ENOSPC
    pub const BUSY: &[i32] = &[16]; // EBUSY
    pub const TOO_MANY_FILES: &[i32] = &[23, 24]; // ENFILE, EMFILE
}

#[cfg(windows)]
mod os_codes {
    pub const DISK_FULL: &[i32] = &[39, 112]; // ERROR_HANDLE_DISK_FULL, ERROR_DISK_FULL
    pub const BUSY: &[i32] = &[32, 33]; // ERROR_SHARING_VIOLATION, ERROR_LOCK_VIOLATION
    pub const TOO_MANY_FILES: &[i32] = &[4]; // ERROR_TOO_MANY_OPEN_FILES
}

#[cfg(not(any(unix, windows)))]
mod os_codes {
    pub const DISK_FULL: &[i32] = &[];
    pub const BUSY: &[i32] = &[];
    pub const TOO_MANY_FILES: &[i32] = &[];
}

impl StorageError {
    /// Classify an I/O error that occurred while accessing `path`.
    pub fn from_io(err: io::Error, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();

        match err.kind() {
            io::ErrorKind::NotFound => return Self::NotFound { path },
            io::ErrorKind::PermissionDenied => return Self::PermissionDenied { path },
            io::ErrorKind::WouldBlock => return Self::WouldBlock { path },
            io::ErrorKind::TimedOut => return Self::TimedOut { path },
            _ => {}
        }

        if let Some(code) = err.raw_os_error() {
            if os_codes::DISK_FULL.contains(&code) {
                return Self::DiskFull { path };
            }
            if os_codes::BUSY.contains(&code) {
                return Self::Busy {
                    path,
                    detail: err.to_string(),
                };
            }
            if os_codes::TOO_MANY_FILES.contains(&code) {
                return Self::TooManyOpenFiles { path };
            }
        }

        Self::Io { path, source: err }
    }

    pub fn corrupted(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        Self::Corrupted {
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Whether a retry has a realistic chance of succeeding.
    ///
    /// Busy/locked, descriptor exhaustion, EAGAIN and timeouts are transient.
    /// Permission, not-found, disk-full and corruption are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Busy { .. }
                | Self::TooManyOpenFiles { .. }
                | Self::WouldBlock { .. }
                | Self::TimedOut { .. }
        )
    }

    /// The path the failing operation was working on.
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound { path }
            | Self::PermissionDenied { path }
            | Self::DiskFull { path }
            | Self::Busy { path, .. }
            | Self::TooManyOpenFiles { path }
            | Self::WouldBlock { path }
            | Self::TimedOut { path }
            | Self::Corrupted { path, .. }
            | Self::Io { path, .. } => path,
        }
    }

    /// Message for humans, derived from the classified cause.
    pub fn user_message(&self) -> String {
        let path = self.path().display();
        match self {
            Self::NotFound { .. } => format!("File not found: {path}"),
            Self::PermissionDenied { .. } => {
                format!("Permission denied: {path}. Check file ownership and mode.")
            }
            Self::DiskFull { .. } => {
                format!("Disk full: could not write {path}. Free some space and retry.")
            }
            Self::Busy { .. } => {
                format!("File busy: {path} is locked by another process. Retry shortly.")
            }
            Self::TooManyOpenFiles { .. } => {
                format!("Too many open files while accessing {path}. Close other programs and retry.")
            }
            Self::WouldBlock { .. } | Self::TimedOut { .. } => {
                format!("Temporarily unavailable: {path}. Retry shortly.")
            }
            Self::Corrupted { reason, .. } => format!("Corrupted file {path}: {reason}"),
            Self::Io { source, .. } => format!("Could not access {path}: {}", source.kind()),
        }
    }

    pub(crate) fn join_failure(path: &Path, err: tokio::task::JoinError) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::Other, err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_not_found() {
        let err = io::Error::from(io::ErrorKind::NotFound);
        let classified = StorageError::from_io(err, "/tmp/x.json");
        assert!(matches!(classified, StorageError::NotFound { .. }));
        assert!(!classified.is_retryable());
    }

    #[test]
    fn classify_permission_is_not_retryable() {
        let err = io::Error::from(io::ErrorKind::PermissionDenied);
        let classified = StorageError::from_io(err, "/tmp/x.json");
        assert!(matches!(classified, StorageError::PermissionDenied { .. }));
        assert!(!classified.is_retryable());
    }

    #[test]
    fn classify_would_block_is_retryable() {
        let err = io::Error::from(io::ErrorKind::WouldBlock);
        assert!(StorageError::from_io(err, "a").is_retryable());
    }

    #[cfg(unix)]
    #[test]
    fn classify_raw_os_codes() {
        let full = StorageError::from_io(io::Error::from_raw_os_error(28), "a");
        assert!(matches!(full, StorageError::DiskFull { .. }));
        assert!(!full.is_retryable());

        let busy = StorageError::from_io(io::Error::from_raw_os_error(16), "a");
        assert!(matches!(busy, StorageError::Busy { .. }));
        assert!(busy.is_retryable());

        let emfile = StorageError::from_io(io::Error::from_raw_os_error(24), "a");
        assert!(matches!(emfile, StorageError::TooManyOpenFiles { .. }));
        assert!(emfile.is_retryable());
    }

    #[test]
    fn user_message_avoids_raw_os_text() {
        let err = StorageError::DiskFull {
            path: PathBuf::from("records/x.json"),
        };
        assert!(err.user_message().starts_with("Disk full"));

        let err = StorageError::Busy {
            path: PathBuf::from("records/x.json"),
            detail: "lock timeout".into(),
        };
        assert!(err.user_message().starts_with("File busy"));
    }
}
