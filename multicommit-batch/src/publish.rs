//! PublishStage: stage, commit, and push the copied file per project.
//!
//! Only records that are included and copied successfully are attempted.
//! Each project is opened, staged, committed, and pushed independently; a
//! failure is recorded on that project and the loop moves on.

use multicommit_core::{
    mapper::RelativeTarget, ProjectName, ProjectRecord, RevisionId, Settings, VersionControl,
};

use crate::error::PublishError;

/// Outcome of publishing to one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishResult {
    /// Committed (and pushed, unless pushing is disabled in settings).
    Published { revision: RevisionId },
    /// The staged file matched HEAD; no commit was created.
    Unchanged,
}

/// One attempted project's entry in the PublishStage result list.
#[derive(Debug)]
pub struct PublishOutcome {
    pub project: ProjectName,
    pub result: Result<PublishResult, PublishError>,
}

/// Publish the copied change in every eligible record.
///
/// Ineligible records (excluded, or copy not successful) are neither touched
/// nor listed in the result.
pub fn run_publish<V: VersionControl>(
    records: &mut [ProjectRecord],
    relative: &RelativeTarget,
    vcs: &V,
    settings: &Settings,
) -> Vec<PublishOutcome> {
    let mut outcomes = Vec::new();
    for record in records.iter_mut().filter(|r| r.is_publish_candidate()) {
        let mut result = publish_one(record, relative, vcs, settings);

        let transition = match &result {
            Ok(PublishResult::Published { revision }) => {
                tracing::info!("[{}] published {}", record.name(), revision.short());
                record.mark_published(revision.clone())
            }
            Ok(PublishResult::Unchanged) => {
                tracing::debug!("[{}] no change to commit", record.name());
                record.mark_publish_skipped()
            }
            Err(err) => {
                tracing::warn!("[{}] publish failed: {err}", record.name());
                record.mark_publish_failed(err.to_string())
            }
        };
        if let Err(err) = transition {
            result = Err(PublishError::State(err));
        }

        outcomes.push(PublishOutcome {
            project: record.name().clone(),
            result,
        });
    }
    outcomes
}

fn publish_one<V: VersionControl>(
    record: &ProjectRecord,
    relative: &RelativeTarget,
    vcs: &V,
    settings: &Settings,
) -> Result<PublishResult, PublishError> {
    let path = relative.path();
    let handle = vcs.open(record.path()).map_err(PublishError::Open)?;

    vcs.stage(&handle, path).map_err(PublishError::Stage)?;
    if !vcs
        .has_effective_change(&handle, path)
        .map_err(PublishError::Stage)?
    {
        return Ok(PublishResult::Unchanged);
    }

    let message = settings.commit_message_for(path);
    let revision = vcs
        .commit(&handle, path, &message)
        .map_err(PublishError::Commit)?;

    if settings.push {
        vcs.push(&handle).map_err(|source| PublishError::Push {
            revision: revision.clone(),
            source,
        })?;
    }
    Ok(PublishResult::Published { revision })
}
