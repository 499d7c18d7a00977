use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::{Builder, NamedTempFile};
use tracing::warn;

use super::{StorageError, StorageResult};

/// A fully written and synced temp file that has not yet replaced its target.
///
/// Dropping a `StagedWrite` without calling [`commit`](Self::commit) removes the
/// temp file and leaves the target untouched.
#[derive(Debug)]
pub struct StagedWrite {
    tmp: NamedTempFile,
    target: PathBuf,
}

impl StagedWrite {
    pub fn temp_path(&self) -> &Path {
        self.tmp.path()
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Atomically rename the temp file onto the target.
    pub fn commit(self) -> StorageResult<()> {
        let Self { tmp, target } = self;
        match tmp.persist(&target) {
            Ok(_) => Ok(()),
            Err(e) => {
                let err = StorageError::from_io(e.error, &target);
                set_aside(e.file);
                Err(err)
            }
        }
    }
}

/// Write `bytes` to a hidden sibling temp file of `target` and fsync it.
///
/// Layout: `<dir>/.<target name>.<random>.tmp`
pub fn stage(target: &Path, bytes: &[u8]) -> StorageResult<StagedWrite> {
    let dir = parent_dir(target);
    ensure_dir_sync(dir)?;

    let name = target
        .file_name()
        .ok_or_else(|| StorageError::Io {
            path: target.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "target has no file name"),
        })?
        .to_string_lossy()
        .into_owned();

    let mut tmp = Builder::new()
        .prefix(&format!(".{name}."))
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| StorageError::from_io(e, target))?;

    let written = tmp.write_all(bytes).and_then(|_| tmp.as_file().sync_all());
    if let Err(e) = written {
        set_aside(tmp);
        return Err(StorageError::from_io(e, target));
    }

    Ok(StagedWrite {
        tmp,
        target: target.to_path_buf(),
    })
}

/// Blocking atomic write: stage then commit.
pub fn write_atomic_sync(target: &Path, bytes: &[u8]) -> StorageResult<()> {
    stage(target, bytes)?.commit()
}

/// Atomically replace `target` with `bytes`.
///
/// Readers observe either the complete previous content or the complete new
/// content. On failure the temp file is renamed to `*.tmp.broken` instead of
/// being deleted.
pub async fn write_atomic(target: &Path, bytes: Vec<u8>) -> StorageResult<()> {
    let owned = target.to_path_buf();
    tokio::task::spawn_blocking(move || write_atomic_sync(&owned, &bytes))
        .await
        .map_err(|e| StorageError::join_failure(target, e))?
}

/// Create `dir` and its parents. An existing directory is success.
pub async fn ensure_dir(dir: &Path) -> StorageResult<()> {
    match tokio::fs::create_dir_all(dir).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
        Err(e) => Err(StorageError::from_io(e, dir)),
    }
}

pub(crate) fn ensure_dir_sync(dir: &Path) -> StorageResult<()> {
    match fs::create_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
        Err(e) => Err(StorageError::from_io(e, dir)),
    }
}

/// Read a whole file.
pub async fn read_file(path: &Path) -> StorageResult<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .map_err(|e| StorageError::from_io(e, path))
}

fn parent_dir(target: &Path) -> &Path {
    match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

// Best-effort: keep the temp file for inspection. Failures here are logged
// and never replace the caller's original error.
fn set_aside(tmp: NamedTempFile) {
    let kept = match tmp.into_temp_path().keep() {
        Ok(path) => path,
        Err(e) => {
            warn!(event = "storage.set_aside_failed", error = %e.error);
            return;
        }
    };

    let mut broken: OsString = kept.clone().into_os_string();
    broken.push(".broken");
    if let Err(e) = fs::rename(&kept, &broken) {
        warn!(
            event = "storage.set_aside_failed",
            path = %kept.display(),
            error = %e,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a").join("b").join("rec.json");
        write_atomic_sync(&target, b"{}").unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"{}");
    }

    #[test]
    fn write_replaces_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("rec.json");
        write_atomic_sync(&target, b"old").unwrap();
        write_atomic_sync(&target, b"new").unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"new");
        assert_eq!(entries(dir.path()), vec!["rec.json".to_string()]);
    }

    #[test]
    fn staged_temp_is_hidden_sibling() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("rec.json");
        let staged = stage(&target, b"payload").unwrap();

        let tmp_name = staged.temp_path().file_name().unwrap().to_string_lossy();
        assert!(tmp_name.starts_with(".rec.json."));
        assert!(tmp_name.ends_with(".tmp"));
        assert_eq!(staged.temp_path().parent(), target.parent());
        assert!(!target.exists());

        staged.commit().unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"payload");
    }

    #[test]
    fn abandoned_stage_leaves_target_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("rec.json");
        write_atomic_sync(&target, b"original").unwrap();

        let staged = stage(&target, b"replacement").unwrap();
        drop(staged);

        assert_eq!(fs::read(&target).unwrap(), b"original");
    }

    #[test]
    fn commit_failure_sets_temp_aside() {
        let dir = tempfile::tempdir().unwrap();
        // A directory at the target path makes the rename fail.
        let target = dir.path().join("rec.json");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("occupant"), b"x").unwrap();

        let staged = stage(&target, b"payload").unwrap();
        assert!(staged.commit().is_err());

        let names = entries(dir.path());
        assert!(
            names.iter().any(|n| n.ends_with(".tmp.broken")),
            "expected a .tmp.broken file, got {names:?}"
        );
    }

    #[tokio::test]
    async fn ensure_dir_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("records").join("project");
        ensure_dir(&nested).await.unwrap();
        ensure_dir(&nested).await.unwrap();
        assert!(nested.is_dir());
    }

    #[tokio::test]
    async fn read_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_file(&dir.path().join("missing.json")).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }

    #[tokio::test]
    async fn async_write_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("rec.json");
        write_atomic(&target, b"hello".to_vec()).await.unwrap();
        assert_eq!(read_file(&target).await.unwrap(), b"hello");
    }
}
