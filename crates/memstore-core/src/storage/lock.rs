//! Advisory per-path locking.
//!
//! Locks are `flock`-style advisory locks on a `<target>.lock` sibling file.
//! They only exclude processes that also take the lock; they are not a
//! substitute for mandatory OS locks. Lock files are never deleted, since
//! unlinking a lock file another process is waiting on would split the lock.

use std::ffi::OsString;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

use fs2::FileExt;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::atomic::{ensure_dir, write_atomic};
use super::{StorageError, StorageResult};

/// Default lock acquisition timeout.
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5_000;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// RAII guard for an exclusive advisory lock. Released on drop.
#[derive(Debug)]
pub struct PathLock {
    file: File,
    lock_path: PathBuf,
}

impl PathLock {
    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }
}

impl Drop for PathLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!(
                event = "storage.unlock_failed",
                path = %self.lock_path.display(),
                error = %e,
            );
        }
    }
}

/// Path of the lock file guarding `target`.
pub fn lock_path_for(target: &Path) -> PathBuf {
    let mut os: OsString = target.as_os_str().to_owned();
    os.push(".lock");
    PathBuf::from(os)
}

/// Acquire the exclusive lock for `target`, polling until `timeout` elapses.
///
/// Returns [`StorageError::Busy`] when the lock is still held by someone else
/// at the deadline. No retry happens here beyond the polling window.
pub async fn acquire_lock(target: &Path, timeout: Duration) -> StorageResult<PathLock> {
    let lock_path = lock_path_for(target);
    if let Some(parent) = lock_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent).await?;
    }

    let file = tokio::fs::OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(&lock_path)
        .await
        .map_err(|e| StorageError::from_io(e, &lock_path))?
        .into_std()
        .await;

    let contended = fs2::lock_contended_error().raw_os_error();
    let deadline = Instant::now() + timeout;

    loop {
        match file.try_lock_exclusive() {
            Ok(()) => {
                debug!(event = "storage.lock_acquired", path = %lock_path.display());
                return Ok(PathLock { file, lock_path });
            }
            Err(e) if e.raw_os_error().is_some() && e.raw_os_error() == contended => {
                let now = Instant::now();
                if now >= deadline {
                    return Err(StorageError::Busy {
                        path: target.to_path_buf(),
                        detail: format!("lock not acquired within {} ms", timeout.as_millis()),
                    });
                }
                tokio::time::sleep(POLL_INTERVAL.min(deadline - now)).await;
            }
            Err(e) => return Err(StorageError::from_io(e, &lock_path)),
        }
    }
}

/// Atomically write `target` while holding its exclusive lock.
///
/// The lock is released on every exit path, including write failures.
pub async fn write_locked(target: &Path, bytes: Vec<u8>, timeout: Duration) -> StorageResult<()> {
    let _guard = acquire_lock(target, timeout).await?;
    write_atomic(target, bytes).await
}
