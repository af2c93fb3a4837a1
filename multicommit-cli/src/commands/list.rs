//! `multicommit list <root>`: discovered projects and their branches.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use multicommit_core::{registry, BranchLabel};
use multicommit_git::GitVcs;

use super::load_settings;

/// Arguments for `multicommit list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Directory whose subdirectories are the projects.
    pub root: PathBuf,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct ProjectJson {
    name: String,
    path: PathBuf,
    branch: String,
}

#[derive(Tabled)]
struct ProjectRow {
    #[tabled(rename = "project")]
    name: String,
    #[tabled(rename = "branch")]
    branch: String,
    #[tabled(rename = "path")]
    path: String,
}

impl ListArgs {
    pub fn run(self) -> Result<()> {
        let settings = load_settings()?;
        let records = registry::discover(&self.root, &GitVcs::new(&settings))
            .with_context(|| format!("failed to read projects under {}", self.root.display()))?;

        if self.json {
            let payload: Vec<ProjectJson> = records
                .iter()
                .map(|r| ProjectJson {
                    name: r.name().0.clone(),
                    path: r.path().to_path_buf(),
                    branch: r.branch_label().to_string(),
                })
                .collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).context("failed to serialize projects")?
            );
            return Ok(());
        }

        if records.is_empty() {
            println!("No projects found under {}.", self.root.display());
            return Ok(());
        }

        let rows: Vec<ProjectRow> = records
            .iter()
            .map(|r| ProjectRow {
                name: r.name().0.clone(),
                branch: match r.branch_label() {
                    BranchLabel::Branch(name) => name.green().to_string(),
                    other => other.to_string().bright_black().to_string(),
                },
                path: r.path().display().to_string(),
            })
            .collect();
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    }
}
