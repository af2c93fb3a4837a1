//! Error types for multicommit-batch.
//!
//! [`BatchError`] aborts an operation before any project is touched.
//! [`CopyError`] and [`PublishError`] are captured per project and never
//! escape the stage loops. [`RevertError`] concerns a single project.

use std::path::PathBuf;

use thiserror::Error;

use multicommit_core::{MapError, ProjectName, RegistryError, RevisionId, StateError, VcsError};

/// Batch-level configuration errors.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("no projects found under {root}")]
    NoProjects { root: PathBuf },

    #[error("cannot map target file: {0}")]
    Map(#[from] MapError),

    #[error("update file not found at {path}")]
    UpdateFileMissing { path: PathBuf },

    /// Reading the update file for a preview failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("debug mode is enabled; publish is disabled")]
    DebugMode,

    #[error("unknown project '{0}'")]
    UnknownProject(ProjectName),

    #[error("revert failed: {0}")]
    Revert(#[from] RevertError),
}

/// Why one project's copy failed.
#[derive(Debug, Error)]
pub enum CopyError {
    #[error("target not found: {path}")]
    TargetNotFound { path: PathBuf },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Why one project's publish failed. A prior copy is never rolled back.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("cannot open repository: {0}")]
    Open(#[source] VcsError),

    #[error("cannot stage change: {0}")]
    Stage(#[source] VcsError),

    #[error("cannot commit: {0}")]
    Commit(#[source] VcsError),

    /// The commit exists locally; only the push failed.
    #[error("committed {revision} locally but push failed: {source}")]
    Push {
        revision: RevisionId,
        #[source]
        source: VcsError,
    },

    #[error(transparent)]
    State(#[from] StateError),
}

/// Why a revert was refused or failed. The record is left unchanged.
#[derive(Debug, Error)]
pub enum RevertError {
    #[error("no revision to revert for project '{project}'")]
    NothingToRevert { project: ProjectName },

    /// The confirmation was issued for another project or revision.
    #[error("confirmation does not match project '{project}' at {revision}")]
    ConfirmationMismatch {
        project: ProjectName,
        revision: RevisionId,
    },

    #[error("revision {revision} has no parent to reset to")]
    NoParent { revision: RevisionId },

    /// HEAD is no longer the published revision; a reset would drop newer commits.
    #[error("HEAD moved since publish (expected {expected}, found {})", .found.as_ref().map_or("no commit", |r| r.0.as_str()))]
    HeadMoved {
        expected: RevisionId,
        found: Option<RevisionId>,
    },

    #[error(transparent)]
    Vcs(#[from] VcsError),
}

pub(crate) fn copy_io_err(path: impl Into<PathBuf>, source: std::io::Error) -> CopyError {
    CopyError::Io {
        path: path.into(),
        source,
    }
}
