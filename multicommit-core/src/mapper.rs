//! Maps the operator's target file onto a path relative to its project.
//!
//! The target is picked inside one reference project; the same relative path
//! is then joined onto every other project root. Matching is component-wise
//! (`/work/api` is not a prefix of `/work/api-v2/x`) after lexical removal of
//! `.` and `..`. No filesystem access happens here.

use std::path::{Component, Path, PathBuf};

use crate::error::MapError;
use crate::types::{ProjectName, ProjectRecord};

/// The single relative path shared by every project in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelativeTarget {
    reference: ProjectName,
    path: PathBuf,
}

impl RelativeTarget {
    /// Project whose root contained the operator's target file.
    pub fn reference(&self) -> &ProjectName {
        &self.reference
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Location of the equivalent file inside `project_root`.
    pub fn join_onto(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.path)
    }
}

/// Resolve `target_file` against the registered project roots.
pub fn resolve_relative_path<'a, I>(roots: I, target_file: &Path) -> Result<RelativeTarget, MapError>
where
    I: IntoIterator<Item = (&'a ProjectName, &'a Path)>,
{
    if !target_file.is_absolute() {
        return Err(MapError::RelativeTarget {
            target: target_file.to_path_buf(),
        });
    }
    let target = normalize(target_file);

    let matches: Vec<(&ProjectName, PathBuf)> = roots
        .into_iter()
        .map(|(name, root)| (name, normalize(root)))
        .filter(|(_, root)| target.starts_with(root))
        .collect();

    let (reference, root) = match matches.as_slice() {
        [(name, root)] => ((*name).clone(), root.clone()),
        _ => {
            return Err(MapError::AmbiguousOrMissingBase {
                target: target_file.to_path_buf(),
                matched: matches.iter().map(|(n, _)| (*n).clone()).collect(),
            })
        }
    };

    let relative = target
        .strip_prefix(&root)
        .map(Path::to_path_buf)
        .unwrap_or_default();
    if relative.as_os_str().is_empty() {
        return Err(MapError::TargetIsProjectRoot {
            target: target_file.to_path_buf(),
        });
    }

    tracing::debug!("target maps to {} (reference project {reference})", relative.display());
    Ok(RelativeTarget {
        reference,
        path: relative,
    })
}

/// [`resolve_relative_path`] over a registry snapshot.
pub fn resolve_for_records(
    records: &[ProjectRecord],
    target_file: &Path,
) -> Result<RelativeTarget, MapError> {
    resolve_relative_path(records.iter().map(|r| (r.name(), r.path())), target_file)
}

/// Remove `.` and `..` components without touching the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
