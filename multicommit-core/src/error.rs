//! Error types for multicommit-core.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::{CopyStatus, ProjectName};

/// Failures while discovering projects under a root directory.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The selected root does not exist or is not a directory.
    #[error("projects root not found at {path}")]
    RootNotFound { path: PathBuf },

    /// Listing the root failed (permission denied, etc.).
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures mapping the target file onto a project-relative path.
///
/// Every variant is a batch-level configuration error: nothing has been
/// touched when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    /// Zero or several project roots contain the target file.
    #[error("target file {target} must lie inside exactly one project (matched: {matched:?})")]
    AmbiguousOrMissingBase {
        target: PathBuf,
        matched: Vec<ProjectName>,
    },

    #[error("target file path must be absolute: {target}")]
    RelativeTarget { target: PathBuf },

    /// The target path is the project directory itself.
    #[error("target {target} is a project root, not a file inside it")]
    TargetIsProjectRoot { target: PathBuf },
}

/// Illegal [`crate::types::ProjectRecord`] transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error(
        "project '{project}' is not eligible for publish (copy {copy_status}, included: {included})"
    )]
    NotPublishCandidate {
        project: ProjectName,
        copy_status: CopyStatus,
        included: bool,
    },

    #[error("no revision to revert for project '{project}'")]
    NothingToRevert { project: ProjectName },
}

/// Failure reported by a [`crate::vcs::VersionControl`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VcsError {
    /// The directory is not a working tree (and not a bare repository).
    #[error("{path} is not a repository")]
    NotARepository { path: PathBuf },

    /// Any other backend failure, flattened to its message.
    #[error("{operation} failed: {message}")]
    Backend {
        operation: &'static str,
        message: String,
    },
}

impl VcsError {
    pub fn backend(operation: &'static str, message: impl Into<String>) -> Self {
        VcsError::Backend {
            operation,
            message: message.into(),
        }
    }
}

/// Failures loading `~/.multicommit/config.yaml`.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Includes file path and line context from serde_yaml.
    #[error("failed to parse settings at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `dirs::home_dir()` returned `None`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    /// The commit message template lacks the `{path}` placeholder.
    #[error("commit_message template must contain {{path}}: {template:?}")]
    InvalidTemplate { template: String },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RegistryError {
    RegistryError::Io {
        path: path.into(),
        source,
    }
}
