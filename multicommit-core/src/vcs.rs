//! The version-control capability consumed by discovery, publish, and revert.
//!
//! The engine never talks to git directly. `multicommit-git` provides the
//! libgit2 implementation; tests substitute an in-memory one.
//!
//! A handle refers to exactly one working tree. Callers never use two handles
//! for the same path at once.

use std::path::Path;

use crate::error::VcsError;
use crate::types::{BranchLabel, RevisionId};

/// What `current_branch` can report for an opened repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchState {
    Branch(String),
    Bare,
}

impl From<BranchState> for BranchLabel {
    fn from(state: BranchState) -> Self {
        match state {
            BranchState::Branch(name) => BranchLabel::Branch(name),
            BranchState::Bare => BranchLabel::BareRepository,
        }
    }
}

pub trait VersionControl {
    type Handle;

    /// Open the working tree rooted exactly at `path` (no upward search).
    fn open(&self, path: &Path) -> Result<Self::Handle, VcsError>;

    fn current_branch(&self, handle: &Self::Handle) -> Result<BranchState, VcsError>;

    /// Stage `relative_path` (relative to the working tree root).
    fn stage(&self, handle: &Self::Handle, relative_path: &Path) -> Result<(), VcsError>;

    /// Whether the staged `relative_path` differs from its HEAD version.
    /// Only that path is considered; unrelated pending changes are ignored.
    fn has_effective_change(
        &self,
        handle: &Self::Handle,
        relative_path: &Path,
    ) -> Result<bool, VcsError>;

    /// Commit the staged `relative_path` on top of HEAD and return the new
    /// revision. Other staged paths are not included.
    fn commit(
        &self,
        handle: &Self::Handle,
        relative_path: &Path,
        message: &str,
    ) -> Result<RevisionId, VcsError>;

    /// Publish the current branch to the configured remote.
    fn push(&self, handle: &Self::Handle) -> Result<(), VcsError>;

    /// `None` on an unborn branch.
    fn head_revision(&self, handle: &Self::Handle) -> Result<Option<RevisionId>, VcsError>;

    /// First parent of `revision`; `None` for a root commit.
    fn parent_revision(
        &self,
        handle: &Self::Handle,
        revision: &RevisionId,
    ) -> Result<Option<RevisionId>, VcsError>;

    /// Uncommitted modifications (staged, unstaged, or untracked) exist.
    fn is_dirty(&self, handle: &Self::Handle) -> Result<bool, VcsError>;

    /// Move HEAD to `revision` and overwrite index and working tree with it.
    fn hard_reset_to(&self, handle: &Self::Handle, revision: &RevisionId) -> Result<(), VcsError>;
}
