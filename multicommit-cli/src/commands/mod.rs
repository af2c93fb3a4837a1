pub mod console;
pub mod diff;
pub mod list;
pub mod run;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use multicommit_batch::Batch;
use multicommit_core::{config, BatchContext, Settings};
use multicommit_git::GitVcs;

/// Paths shared by `diff` and `run`.
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Directory whose subdirectories are the projects.
    #[arg(long)]
    pub root: PathBuf,

    /// File whose content is copied into every project.
    #[arg(long)]
    pub update: PathBuf,

    /// The file to replace, given as its path inside any one project.
    #[arg(long)]
    pub target: PathBuf,
}

impl BatchArgs {
    pub fn context(&self, settings: Settings) -> BatchContext {
        BatchContext::new(self.root.clone(), self.update.clone(), self.target.clone())
            .with_settings(settings)
    }
}

pub fn load_settings() -> Result<Settings> {
    config::load().context("failed to load ~/.multicommit/config.yaml")
}

/// Discover projects under `context.projects_dir`; an empty root is an error
/// for every command that needs a batch.
pub fn open_batch(context: BatchContext) -> Result<Batch<GitVcs>> {
    let vcs = GitVcs::new(&context.settings);
    let root = context.projects_dir.clone();
    let batch = Batch::open(context, vcs)
        .with_context(|| format!("failed to read projects under {}", root.display()))?;
    if batch.is_empty() {
        anyhow::bail!("no projects found under {}", root.display());
    }
    Ok(batch)
}
