//! Batch driver shared by every CLI command.
//!
//! A [`Batch`] owns the context, the discovered records, and the version
//! control capability. Operator actions arrive as [`Command`] values keyed by
//! project name and go through [`Batch::dispatch`].

use std::path::{Path, PathBuf};

use multicommit_core::{
    mapper, registry, summarize, BatchContext, BatchReport, ProjectName, ProjectRecord,
    RelativeTarget, VersionControl,
};

use crate::copy::{run_copy, CopyOutcome};
use crate::error::BatchError;
use crate::preview::{preview, FilePreview};
use crate::publish::{run_publish, PublishOutcome};
use crate::revert::{plan_revert, revert, RevertConfirmation, RevertOutcome, RevertPlan};

/// An operator action.
#[derive(Debug, Clone)]
pub enum Command {
    SetIncluded { project: ProjectName, include: bool },
    Copy,
    Publish,
    Revert {
        project: ProjectName,
        confirmation: RevertConfirmation,
    },
}

/// What a dispatched [`Command`] produced.
#[derive(Debug)]
pub enum CommandOutcome {
    IncludedSet,
    Copied(Vec<CopyOutcome>),
    Published(Vec<PublishOutcome>),
    Reverted(RevertOutcome),
}

/// One batch run over the projects under `context.projects_dir`.
pub struct Batch<V: VersionControl> {
    context: BatchContext,
    vcs: V,
    records: Vec<ProjectRecord>,
}

impl<V: VersionControl> Batch<V> {
    /// Discover the projects. An empty root is not an error here; copy and
    /// publish refuse to run on it.
    pub fn open(mut context: BatchContext, vcs: V) -> Result<Self, BatchError> {
        let given_root = absolute(&context.projects_dir);
        let root = std::fs::canonicalize(&given_root).unwrap_or_else(|_| given_root.clone());
        context.target_file = anchor_target(&given_root, &root, &context.target_file);
        context.projects_dir = root;

        let records = registry::discover(&context.projects_dir, &vcs)?;
        Ok(Self {
            context,
            vcs,
            records,
        })
    }

    pub fn context(&self) -> &BatchContext {
        &self.context
    }

    pub fn vcs(&self) -> &V {
        &self.vcs
    }

    pub fn records(&self) -> &[ProjectRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn record(&self, project: &ProjectName) -> Result<&ProjectRecord, BatchError> {
        self.records
            .iter()
            .find(|r| r.name() == project)
            .ok_or_else(|| BatchError::UnknownProject(project.clone()))
    }

    fn record_mut(&mut self, project: &ProjectName) -> Result<&mut ProjectRecord, BatchError> {
        self.records
            .iter_mut()
            .find(|r| r.name() == project)
            .ok_or_else(|| BatchError::UnknownProject(project.clone()))
    }

    pub fn set_included(&mut self, project: &ProjectName, include: bool) -> Result<(), BatchError> {
        self.record_mut(project)?.set_include_in_publish(include);
        Ok(())
    }

    /// The target path relative to its project root.
    pub fn relative_target(&self) -> Result<RelativeTarget, BatchError> {
        if self.records.is_empty() {
            return Err(BatchError::NoProjects {
                root: self.context.projects_dir.clone(),
            });
        }
        Ok(mapper::resolve_for_records(
            &self.records,
            &self.context.target_file,
        )?)
    }

    /// CopyStage over every project.
    pub fn copy(&mut self) -> Result<Vec<CopyOutcome>, BatchError> {
        let relative = self.relative_target()?;
        if !self.context.update_file.is_file() {
            return Err(BatchError::UpdateFileMissing {
                path: self.context.update_file.clone(),
            });
        }
        tracing::info!(
            "copying {} to {} in {} project(s)",
            self.context.update_file.display(),
            relative.path().display(),
            self.records.len()
        );
        Ok(run_copy(
            &mut self.records,
            &relative,
            &self.context.update_file,
        ))
    }

    /// PublishStage over the included, successfully copied projects.
    pub fn publish(&mut self) -> Result<Vec<PublishOutcome>, BatchError> {
        if self.context.debug_mode {
            return Err(BatchError::DebugMode);
        }
        let relative = self.relative_target()?;
        Ok(run_publish(
            &mut self.records,
            &relative,
            &self.vcs,
            &self.context.settings,
        ))
    }

    pub fn preview(&self) -> Result<Vec<FilePreview>, BatchError> {
        let relative = self.relative_target()?;
        preview(&self.records, &relative, &self.context.update_file)
    }

    pub fn plan_revert(&self, project: &ProjectName) -> Result<RevertPlan, BatchError> {
        Ok(plan_revert(self.record(project)?, &self.vcs)?)
    }

    pub fn revert(
        &mut self,
        project: &ProjectName,
        confirmation: &RevertConfirmation,
    ) -> Result<RevertOutcome, BatchError> {
        let index = self
            .records
            .iter()
            .position(|r| r.name() == project)
            .ok_or_else(|| BatchError::UnknownProject(project.clone()))?;
        Ok(revert(&mut self.records[index], &self.vcs, confirmation)?)
    }

    /// Projects that currently have a revertible published revision.
    pub fn revertible(&self) -> impl Iterator<Item = &ProjectRecord> {
        self.records
            .iter()
            .filter(|r| r.revertible_revision().is_some())
    }

    pub fn report(&self) -> BatchReport {
        summarize(&self.records)
    }

    pub fn dispatch(&mut self, command: Command) -> Result<CommandOutcome, BatchError> {
        match command {
            Command::SetIncluded { project, include } => {
                self.set_included(&project, include)?;
                Ok(CommandOutcome::IncludedSet)
            }
            Command::Copy => self.copy().map(CommandOutcome::Copied),
            Command::Publish => self.publish().map(CommandOutcome::Published),
            Command::Revert {
                project,
                confirmation,
            } => self
                .revert(&project, &confirmation)
                .map(CommandOutcome::Reverted),
        }
    }
}

/// `path` joined onto the current directory when relative, then normalized
/// lexically.
fn absolute(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    mapper::normalize(&joined)
}

/// Move `target` under the canonical projects root without resolving any
/// link below it: a symlinked project or target file keeps the path the
/// operator gave.
fn anchor_target(given_root: &Path, canonical_root: &Path, target: &Path) -> PathBuf {
    let target = absolute(target);
    match target.strip_prefix(given_root) {
        Ok(suffix) => canonical_root.join(suffix),
        Err(_) => target,
    }
}
