//! Governance collaborators consulted on promotion.
//!
//! A record whose sources include a governed (constitution-tier) file may
//! only be promoted with explicit approval. When an actor is named, the
//! ownership reader must also allow that actor to edit each governed source.

use std::path::{Path, PathBuf};

/// Locates and recognizes protected governance files.
pub trait GovernanceDetector: Send + Sync {
    /// The governing file under `root`, if one exists.
    fn find_governing_file(&self, root: &Path) -> Option<PathBuf>;

    /// Whether `path` names a governed file. Pure path check, no disk access.
    fn is_governed(&self, path: &Path) -> bool;
}

/// Ownership / ACL lookup for governed files.
pub trait OwnershipReader: Send + Sync {
    fn can_edit(&self, path: &Path, actor: &str) -> bool;
}

/// Candidate locations, in lookup order, relative to a project root.
pub const CONSTITUTION_PATHS: &[&str] = &[
    "CONSTITUTION.md",
    "constitution.md",
    ".specify/memory/constitution.md",
    "docs/constitution.md",
];

/// Recognizes constitution documents by their conventional locations.
#[derive(Debug, Clone, Default)]
pub struct ConstitutionDetector {
    extra: Vec<PathBuf>,
}

impl ConstitutionDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also treat `relative` (to a project root) as governed.
    pub fn with_path(mut self, relative: impl Into<PathBuf>) -> Self {
        self.extra.push(relative.into());
        self
    }

    fn candidates(&self) -> impl Iterator<Item = PathBuf> + '_ {
        CONSTITUTION_PATHS
            .iter()
            .map(PathBuf::from)
            .chain(self.extra.iter().cloned())
    }
}

impl GovernanceDetector for ConstitutionDetector {
    fn find_governing_file(&self, root: &Path) -> Option<PathBuf> {
        self.candidates()
            .map(|rel| root.join(rel))
            .find(|p| p.is_file())
    }

    fn is_governed(&self, path: &Path) -> bool {
        self.candidates().any(|rel| path.ends_with(&rel))
    }
}

/// Permits every actor. The default when no ACL source is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAllOwnership;

impl OwnershipReader for AllowAllOwnership {
    fn can_edit(&self, _path: &Path, _actor: &str) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_conventional_locations() {
        let d = ConstitutionDetector::new();
        assert!(d.is_governed(Path::new("CONSTITUTION.md")));
        assert!(d.is_governed(Path::new("/repo/constitution.md")));
        assert!(d.is_governed(Path::new("repo/.specify/memory/constitution.md")));
        assert!(d.is_governed(Path::new("docs/constitution.md")));
        assert!(!d.is_governed(Path::new("README.md")));
        assert!(!d.is_governed(Path::new("my-constitution.md")));
    }

    #[test]
    fn extra_paths_are_governed() {
        let d = ConstitutionDetector::new().with_path("policy/GOVERNANCE.md");
        assert!(d.is_governed(Path::new("/repo/policy/GOVERNANCE.md")));
        assert!(!d.is_governed(Path::new("/repo/GOVERNANCE.md")));
    }

    #[test]
    fn finds_file_in_lookup_order() {
        let dir = tempfile::tempdir().unwrap();
        let d = ConstitutionDetector::new();
        assert_eq!(d.find_governing_file(dir.path()), None);

        std::fs::create_dir_all(dir.path().join("docs")).unwrap();
        std::fs::write(dir.path().join("docs/constitution.md"), "# rules").unwrap();
        assert_eq!(
            d.find_governing_file(dir.path()),
            Some(dir.path().join("docs/constitution.md"))
        );

        std::fs::write(dir.path().join("CONSTITUTION.md"), "# rules").unwrap();
        assert_eq!(
            d.find_governing_file(dir.path()),
            Some(dir.path().join("CONSTITUTION.md"))
        );
    }

    #[test]
    fn allow_all_allows() {
        assert!(AllowAllOwnership.can_edit(Path::new("CONSTITUTION.md"), "anyone"));
    }
}
