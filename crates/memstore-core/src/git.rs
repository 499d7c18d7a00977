//! Git integration for deriving project scope identifiers.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

/// Read `remote.origin.url` for the repository containing `dir`.
///
/// Returns `None` when `dir` is not inside a git work tree, has no origin,
/// or git is not available.
pub fn detect_repo_identifier(dir: &Path) -> Option<String> {
    let output = match Command::new("git")
        .args(["config", "--get", "remote.origin.url"])
        .current_dir(dir)
        .output()
    {
        Ok(output) => output,
        Err(e) => {
            debug!(event = "git.unavailable", error = %e);
            return None;
        }
    };

    if !output.status.success() {
        return None;
    }

    let url = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!url.is_empty()).then_some(url)
}

/// Identifier for the project scope of `dir`: the origin remote when there
/// is one, else the canonical directory path.
pub fn project_identifier(dir: &Path) -> String {
    if let Some(url) = detect_repo_identifier(dir) {
        return url;
    }
    let canonical: PathBuf = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
    canonical.to_string_lossy().into_owned()
}
