//! RevertStage: undo one project's published commit with a hard reset.
//!
//! A revert is two steps. [`plan_revert`] inspects the repository and returns
//! a [`RevertPlan`]; only the plan can hand out the [`RevertConfirmation`]
//! that [`revert`] requires. The reset is local and is never pushed.

use multicommit_core::{ProjectName, ProjectRecord, RevisionId, VersionControl};

use crate::error::RevertError;

/// What a revert of one project would do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevertPlan {
    pub project: ProjectName,
    /// The published revision being undone.
    pub revision: RevisionId,
    /// Where HEAD, index, and working tree will be reset to.
    pub parent: RevisionId,
    /// The working tree has uncommitted changes that the reset will discard.
    pub dirty: bool,
}

/// Operator consent for one specific revert. Only obtainable from
/// [`RevertPlan::confirm`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevertConfirmation {
    project: ProjectName,
    revision: RevisionId,
}

impl RevertConfirmation {
    pub fn project(&self) -> &ProjectName {
        &self.project
    }

    pub fn revision(&self) -> &RevisionId {
        &self.revision
    }
}

impl RevertPlan {
    /// Record that the operator accepted this plan.
    pub fn confirm(&self) -> RevertConfirmation {
        RevertConfirmation {
            project: self.project.clone(),
            revision: self.revision.clone(),
        }
    }

    /// Text the console shows before asking for confirmation.
    pub fn warning(&self) -> String {
        let mut text = format!(
            "Hard reset '{}' from {} to {}. The reset is not pushed.",
            self.project,
            self.revision.short(),
            self.parent.short()
        );
        if self.dirty {
            text.push_str(" The working tree has uncommitted changes; they will be lost.");
        }
        text
    }
}

/// A completed revert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevertOutcome {
    pub project: ProjectName,
    pub reverted: RevisionId,
    pub reset_to: RevisionId,
}

/// Inspect `record`'s repository and describe the revert. Mutates nothing.
pub fn plan_revert<V: VersionControl>(
    record: &ProjectRecord,
    vcs: &V,
) -> Result<RevertPlan, RevertError> {
    let revision = revertible(record)?;
    let handle = vcs.open(record.path())?;
    ensure_head_is(vcs, &handle, &revision)?;

    let parent = vcs
        .parent_revision(&handle, &revision)?
        .ok_or_else(|| RevertError::NoParent {
            revision: revision.clone(),
        })?;
    let dirty = vcs.is_dirty(&handle)?;

    Ok(RevertPlan {
        project: record.name().clone(),
        revision,
        parent,
        dirty,
    })
}

/// Hard-reset `record`'s working tree to the parent of its published revision.
///
/// On any error the record is left as it was.
pub fn revert<V: VersionControl>(
    record: &mut ProjectRecord,
    vcs: &V,
    confirmation: &RevertConfirmation,
) -> Result<RevertOutcome, RevertError> {
    let revision = revertible(record)?;
    if confirmation.project != *record.name() || confirmation.revision != revision {
        return Err(RevertError::ConfirmationMismatch {
            project: confirmation.project.clone(),
            revision: confirmation.revision.clone(),
        });
    }

    let handle = vcs.open(record.path())?;
    ensure_head_is(vcs, &handle, &revision)?;
    let parent = vcs
        .parent_revision(&handle, &revision)?
        .ok_or_else(|| RevertError::NoParent {
            revision: revision.clone(),
        })?;

    vcs.hard_reset_to(&handle, &parent)?;
    record
        .mark_reverted()
        .map_err(|_| RevertError::NothingToRevert {
            project: record.name().clone(),
        })?;
    tracing::info!(
        "[{}] reverted {} (now at {})",
        record.name(),
        revision.short(),
        parent.short()
    );

    Ok(RevertOutcome {
        project: record.name().clone(),
        reverted: revision,
        reset_to: parent,
    })
}

fn revertible(record: &ProjectRecord) -> Result<RevisionId, RevertError> {
    record
        .revertible_revision()
        .cloned()
        .ok_or_else(|| RevertError::NothingToRevert {
            project: record.name().clone(),
        })
}

fn ensure_head_is<V: VersionControl>(
    vcs: &V,
    handle: &V::Handle,
    expected: &RevisionId,
) -> Result<(), RevertError> {
    let found = vcs.head_revision(handle)?;
    if found.as_ref() == Some(expected) {
        Ok(())
    } else {
        Err(RevertError::HeadMoved {
            expected: expected.clone(),
            found,
        })
    }
}
