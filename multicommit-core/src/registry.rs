//! Project discovery.
//!
//! Every immediate subdirectory of the selected root is a candidate project.
//! Records come back in the order `read_dir` yields them, which is
//! filesystem-dependent: nothing downstream may rely on it being sorted.

use std::path::Path;

use crate::error::{io_err, RegistryError};
use crate::types::{BranchLabel, ProjectName, ProjectRecord};
use crate::vcs::VersionControl;

/// Build a fresh record set for `root`.
///
/// Returns an empty vector when `root` has no subdirectories; callers report
/// "no projects found" for that case. VCS failures only downgrade the branch
/// label of the affected project.
pub fn discover<V: VersionControl>(
    root: &Path,
    vcs: &V,
) -> Result<Vec<ProjectRecord>, RegistryError> {
    if !root.is_dir() {
        return Err(RegistryError::RootNotFound {
            path: root.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(root).map_err(|e| io_err(root, e))?;
    let mut records = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!("skipping unreadable entry in {}: {err}", root.display());
                continue;
            }
        };
        let path = entry.path();
        // `is_dir` follows symlinks, so linked project checkouts count.
        if !path.is_dir() {
            continue;
        }
        let name = ProjectName::from(entry.file_name().to_string_lossy().into_owned());
        let label = branch_label(vcs, &path);
        tracing::debug!("discovered {name} at {} ({label})", path.display());
        records.push(ProjectRecord::new(name, path, label));
    }

    tracing::info!("discovered {} project(s) under {}", records.len(), root.display());
    Ok(records)
}

/// Classify one directory. Never fails.
pub fn branch_label<V: VersionControl>(vcs: &V, path: &Path) -> BranchLabel {
    let handle = match vcs.open(path) {
        Ok(handle) => handle,
        Err(err) => {
            tracing::debug!("{}: {err}", path.display());
            return BranchLabel::NotARepository;
        }
    };
    match vcs.current_branch(&handle) {
        Ok(state) => state.into(),
        Err(err) => {
            tracing::warn!("cannot read branch of {}: {err}", path.display());
            BranchLabel::NotARepository
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::path::PathBuf;

    use tempfile::TempDir;

    use super::*;
    use crate::error::VcsError;
    use crate::types::RevisionId;
    use crate::vcs::BranchState;

    /// Treats directories containing a `HEAD` file as repositories whose
    /// branch is that file's content; `bare` marks a bare repository and
    /// `broken` makes `current_branch` fail.
    struct MarkerVcs;

    impl VersionControl for MarkerVcs {
        type Handle = PathBuf;

        fn open(&self, path: &Path) -> Result<PathBuf, VcsError> {
            if path.join("HEAD").exists() {
                Ok(path.to_path_buf())
            } else {
                Err(VcsError::NotARepository {
                    path: path.to_path_buf(),
                })
            }
        }

        fn current_branch(&self, handle: &PathBuf) -> Result<BranchState, VcsError> {
            let head = std::fs::read_to_string(handle.join("HEAD")).unwrap();
            match head.trim() {
                "bare" => Ok(BranchState::Bare),
                "broken" => Err(VcsError::backend("head", "corrupt")),
                name => Ok(BranchState::Branch(name.to_string())),
            }
        }

        fn stage(&self, _: &PathBuf, _: &Path) -> Result<(), VcsError> {
            unimplemented!()
        }
        fn has_effective_change(&self, _: &PathBuf, _: &Path) -> Result<bool, VcsError> {
            unimplemented!()
        }
        fn commit(&self, _: &PathBuf, _: &Path, _: &str) -> Result<RevisionId, VcsError> {
            unimplemented!()
        }
        fn push(&self, _: &PathBuf) -> Result<(), VcsError> {
            unimplemented!()
        }
        fn head_revision(&self, _: &PathBuf) -> Result<Option<RevisionId>, VcsError> {
            unimplemented!()
        }
        fn parent_revision(
            &self,
            _: &PathBuf,
            _: &RevisionId,
        ) -> Result<Option<RevisionId>, VcsError> {
            unimplemented!()
        }
        fn is_dirty(&self, _: &PathBuf) -> Result<bool, VcsError> {
            unimplemented!()
        }
        fn hard_reset_to(&self, _: &PathBuf, _: &RevisionId) -> Result<(), VcsError> {
            unimplemented!()
        }
    }

    fn project(root: &TempDir, name: &str, head: Option<&str>) {
        let dir = root.path().join(name);
        std::fs::create_dir_all(&dir).unwrap();
        if let Some(head) = head {
            std::fs::write(dir.join("HEAD"), head).unwrap();
        }
    }

    #[test]
    fn discovers_only_directories() {
        let root = TempDir::new().unwrap();
        project(&root, "api", Some("main"));
        project(&root, "web", None);
        std::fs::write(root.path().join("notes.txt"), "x").unwrap();

        let records = discover(root.path(), &MarkerVcs).unwrap();
        let names: BTreeSet<_> = records.iter().map(|r| r.name().0.clone()).collect();
        assert_eq!(names, BTreeSet::from(["api".to_string(), "web".to_string()]));
        assert!(records.iter().all(|r| r.include_in_publish()));
    }

    #[test]
    fn classifies_branch_labels() {
        let root = TempDir::new().unwrap();
        project(&root, "api", Some("develop"));
        project(&root, "mirror", Some("bare"));
        project(&root, "plain", None);
        project(&root, "corrupt", Some("broken"));

        let records = discover(root.path(), &MarkerVcs).unwrap();
        let label = |name: &str| {
            records
                .iter()
                .find(|r| r.name().0 == name)
                .map(|r| r.branch_label().clone())
                .unwrap()
        };
        assert_eq!(label("api"), BranchLabel::Branch("develop".into()));
        assert_eq!(label("mirror"), BranchLabel::BareRepository);
        assert_eq!(label("plain"), BranchLabel::NotARepository);
        assert_eq!(label("corrupt"), BranchLabel::NotARepository);
    }

    #[test]
    fn empty_root_yields_empty_registry() {
        let root = TempDir::new().unwrap();
        let records = discover(root.path(), &MarkerVcs).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn missing_root_is_an_error() {
        let root = TempDir::new().unwrap();
        let err = discover(&root.path().join("nope"), &MarkerVcs).unwrap_err();
        assert!(matches!(err, RegistryError::RootNotFound { .. }));
        assert!(err.to_string().contains("projects root not found"));
    }

    #[test]
    fn record_paths_are_children_of_root() {
        let root = TempDir::new().unwrap();
        project(&root, "api", None);
        let records = discover(root.path(), &MarkerVcs).unwrap();
        assert_eq!(records[0].path(), root.path().join("api"));
    }
}
