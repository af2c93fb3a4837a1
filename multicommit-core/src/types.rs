//! Domain types for a multicommit batch.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem paths.
//! [`ProjectRecord`] keeps its status fields private: they only move through the
//! transition methods below, which refuse transitions the batch lifecycle forbids.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::StateError;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Directory basename of a project; the identity key within one batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectName(pub String);

impl fmt::Display for ProjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ProjectName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProjectName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Opaque identifier of a revision created by the VCS (a commit id for git).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RevisionId(pub String);

impl RevisionId {
    /// First seven characters, the way git abbreviates commit ids.
    pub fn short(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(7)
            .map(|(i, _)| i)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for RevisionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RevisionId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// What the VCS reported about a project directory at discovery time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "name")]
pub enum BranchLabel {
    Branch(String),
    BareRepository,
    NotARepository,
}

impl fmt::Display for BranchLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BranchLabel::Branch(name) => f.write_str(name),
            BranchLabel::BareRepository => write!(f, "bare repository"),
            BranchLabel::NotARepository => write!(f, "not a repository"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CopyStatus {
    #[default]
    Pending,
    Success,
    Failed,
}

impl fmt::Display for CopyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CopyStatus::Pending => write!(f, "pending"),
            CopyStatus::Success => write!(f, "success"),
            CopyStatus::Failed => write!(f, "failed"),
        }
    }
}

/// `Skipped` means the staged content matched HEAD and no commit was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CommitStatus {
    #[default]
    Pending,
    Success,
    Failed,
    Skipped,
}

impl fmt::Display for CommitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitStatus::Pending => write!(f, "pending"),
            CommitStatus::Success => write!(f, "success"),
            CommitStatus::Failed => write!(f, "failed"),
            CommitStatus::Skipped => write!(f, "skipped"),
        }
    }
}

// ---------------------------------------------------------------------------
// ProjectRecord
// ---------------------------------------------------------------------------

/// One discovered project directory and its progress through the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectRecord {
    name: ProjectName,
    path: PathBuf,
    branch_label: BranchLabel,
    include_in_publish: bool,
    copy_status: CopyStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    copy_error: Option<String>,
    copy_changed: bool,
    commit_status: CommitStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    publish_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_published_revision: Option<RevisionId>,
    revert_available: bool,
}

impl ProjectRecord {
    /// A freshly discovered project: included, nothing copied or published.
    pub fn new(name: ProjectName, path: PathBuf, branch_label: BranchLabel) -> Self {
        Self {
            name,
            path,
            branch_label,
            include_in_publish: true,
            copy_status: CopyStatus::Pending,
            copy_error: None,
            copy_changed: false,
            commit_status: CommitStatus::Pending,
            publish_error: None,
            last_published_revision: None,
            revert_available: false,
        }
    }

    pub fn name(&self) -> &ProjectName {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn branch_label(&self) -> &BranchLabel {
        &self.branch_label
    }

    pub fn include_in_publish(&self) -> bool {
        self.include_in_publish
    }

    pub fn copy_status(&self) -> CopyStatus {
        self.copy_status
    }

    pub fn copy_error(&self) -> Option<&str> {
        self.copy_error.as_deref()
    }

    /// Whether the last successful copy actually changed the file's bytes.
    pub fn copy_changed(&self) -> bool {
        self.copy_changed
    }

    pub fn commit_status(&self) -> CommitStatus {
        self.commit_status
    }

    pub fn publish_error(&self) -> Option<&str> {
        self.publish_error.as_deref()
    }

    pub fn last_published_revision(&self) -> Option<&RevisionId> {
        self.last_published_revision.as_ref()
    }

    pub fn revert_available(&self) -> bool {
        self.revert_available
    }

    /// Operator toggle. Has no effect on a project whose copy failed: it stays
    /// out of publish regardless.
    pub fn set_include_in_publish(&mut self, include: bool) {
        self.include_in_publish = include;
    }

    /// Included by the operator and copied successfully.
    pub fn is_publish_candidate(&self) -> bool {
        self.include_in_publish && self.copy_status == CopyStatus::Success
    }

    // -- copy stage ---------------------------------------------------------

    /// Back to `pending` before a CopyStage re-run. Publish state is kept: a
    /// published revision stays revertible across copy re-runs.
    pub fn reset_copy(&mut self) {
        self.copy_status = CopyStatus::Pending;
        self.copy_error = None;
        self.copy_changed = false;
    }

    pub fn mark_copied(&mut self, changed: bool) {
        self.copy_status = CopyStatus::Success;
        self.copy_error = None;
        self.copy_changed = changed;
    }

    pub fn mark_copy_failed(&mut self, error: impl Into<String>) {
        self.copy_status = CopyStatus::Failed;
        self.copy_error = Some(error.into());
        self.copy_changed = false;
    }

    // -- publish stage ------------------------------------------------------

    fn ensure_publish_candidate(&self) -> Result<(), StateError> {
        if self.is_publish_candidate() {
            Ok(())
        } else {
            Err(StateError::NotPublishCandidate {
                project: self.name.clone(),
                copy_status: self.copy_status,
                included: self.include_in_publish,
            })
        }
    }

    pub fn mark_published(&mut self, revision: RevisionId) -> Result<(), StateError> {
        self.ensure_publish_candidate()?;
        self.commit_status = CommitStatus::Success;
        self.publish_error = None;
        self.last_published_revision = Some(revision);
        self.revert_available = true;
        Ok(())
    }

    pub fn mark_publish_skipped(&mut self) -> Result<(), StateError> {
        self.ensure_publish_candidate()?;
        self.commit_status = CommitStatus::Skipped;
        self.publish_error = None;
        self.last_published_revision = None;
        self.revert_available = false;
        Ok(())
    }

    pub fn mark_publish_failed(&mut self, error: impl Into<String>) -> Result<(), StateError> {
        self.ensure_publish_candidate()?;
        self.commit_status = CommitStatus::Failed;
        self.publish_error = Some(error.into());
        self.last_published_revision = None;
        self.revert_available = false;
        Ok(())
    }

    // -- revert stage -------------------------------------------------------

    /// The revision a revert would undo, if one is still revertible.
    pub fn revertible_revision(&self) -> Option<&RevisionId> {
        if self.revert_available {
            self.last_published_revision.as_ref()
        } else {
            None
        }
    }

    pub fn mark_reverted(&mut self) -> Result<(), StateError> {
        if self.revertible_revision().is_none() {
            return Err(StateError::NothingToRevert {
                project: self.name.clone(),
            });
        }
        self.revert_available = false;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
