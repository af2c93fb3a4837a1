//! `multicommit run`: copy, confirm, publish, then offer reverts.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use multicommit_batch::{
    Batch, Command, CommandOutcome, CopyOutcome, CopyResult, PublishOutcome, PublishResult,
};
use multicommit_core::{BatchReport, ProjectName, VersionControl};

use super::{console, load_settings, open_batch, BatchArgs};

/// Arguments for `multicommit run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub paths: BatchArgs,

    /// Copy only; never commit or push.
    #[arg(long)]
    pub debug: bool,

    /// Leave a project out of publish (it is still copied). Repeatable.
    #[arg(long = "exclude", value_name = "NAME")]
    pub exclude: Vec<String>,

    /// Publish without asking and skip the revert prompt.
    #[arg(long)]
    pub yes: bool,

    /// Print the final report as JSON on stdout.
    #[arg(long)]
    pub json: bool,
}

impl RunArgs {
    pub fn run(self) -> Result<()> {
        let context = self
            .paths
            .context(load_settings()?)
            .with_debug_mode(self.debug);
        let mut batch = open_batch(context)?;

        for name in &self.exclude {
            batch
                .dispatch(Command::SetIncluded {
                    project: ProjectName::from(name.as_str()),
                    include: false,
                })
                .with_context(|| format!("cannot exclude '{name}'"))?;
        }

        let copies = match batch.dispatch(Command::Copy).context("copy aborted")? {
            CommandOutcome::Copied(outcomes) => outcomes,
            _ => Vec::new(),
        };
        if !self.json {
            print_copies(&copies);
            println!("{}", batch.report());
        }

        if self.debug {
            if !self.json {
                println!("{}", "[debug] publish skipped".yellow());
            }
            return finish(&batch.report(), self.json);
        }

        if !batch.records().iter().any(|r| r.is_publish_candidate()) {
            if !self.json {
                println!("Nothing to publish.");
            }
            return finish(&batch.report(), self.json);
        }

        if !self.yes && !confirm_publish(&batch)? {
            if !self.json {
                println!("Publish cancelled; copied files were left in place.");
            }
            return finish(&batch.report(), self.json);
        }

        let published = match batch.dispatch(Command::Publish).context("publish aborted")? {
            CommandOutcome::Published(outcomes) => outcomes,
            _ => Vec::new(),
        };
        if !self.json {
            print_publishes(&published);
            println!("{}", batch.report());
        }

        if !self.yes && console::is_interactive() {
            revert_loop(&mut batch)?;
        }
        if self.json {
            finish(&batch.report(), true)?;
        }
        Ok(())
    }
}

fn finish(report: &BatchReport, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(report).context("failed to serialize report")?
        );
    }
    Ok(())
}

fn print_copies(copies: &[CopyOutcome]) {
    for outcome in copies {
        match &outcome.result {
            Ok(CopyResult::Replaced { path }) => {
                println!("  {} {} {}", "✎".green(), outcome.project, path.display())
            }
            Ok(CopyResult::Identical { path }) => {
                println!("  {} {} {}", "·".bright_black(), outcome.project, path.display())
            }
            Err(err) => println!("  {} {} {err}", "✗".red(), outcome.project),
        }
    }
}

fn print_publishes(published: &[PublishOutcome]) {
    for outcome in published {
        match &outcome.result {
            Ok(PublishResult::Published { revision }) => {
                println!("  {} {} {}", "✓".green(), outcome.project, revision.short())
            }
            Ok(PublishResult::Unchanged) => println!(
                "  {} {} {}",
                "·".bright_black(),
                outcome.project,
                "no change".bright_black()
            ),
            Err(err) => println!("  {} {} {err}", "✗".red(), outcome.project),
        }
    }
}

fn confirm_publish<V: VersionControl>(batch: &Batch<V>) -> Result<bool> {
    let candidates: Vec<_> = batch
        .records()
        .iter()
        .filter(|r| r.is_publish_candidate())
        .map(|r| format!("{} ({})", r.name(), r.branch_label()))
        .collect();
    eprintln!("Commit and push to: {}", candidates.join(", "));
    console::confirm("Publish?")
}

/// Offer to undo published commits one project at a time until the operator
/// enters an empty line.
fn revert_loop<V: VersionControl>(batch: &mut Batch<V>) -> Result<()> {
    loop {
        let revertible: Vec<_> = batch.revertible().map(|r| r.name().clone()).collect();
        if revertible.is_empty() {
            return Ok(());
        }
        let names: Vec<_> = revertible.iter().map(|n| n.to_string()).collect();
        eprintln!("Revertible: {}", names.join(", "));
        let Some(answer) = console::ask("Project to revert (empty to finish):")? else {
            return Ok(());
        };
        if answer.is_empty() {
            return Ok(());
        }

        let project = ProjectName::from(answer.as_str());
        let plan = match batch.plan_revert(&project) {
            Ok(plan) => plan,
            Err(err) => {
                eprintln!("{} {err}", "✗".red());
                continue;
            }
        };
        eprintln!("{}", plan.warning().yellow());
        if !console::confirm("Revert?")? {
            continue;
        }
        match batch.dispatch(Command::Revert {
            project,
            confirmation: plan.confirm(),
        }) {
            Ok(CommandOutcome::Reverted(outcome)) => println!(
                "  {} {} reverted {} (now at {})",
                "↺".green(),
                outcome.project,
                outcome.reverted.short(),
                outcome.reset_to.short()
            ),
            Ok(_) => {}
            Err(err) => eprintln!("{} {err}", "✗".red()),
        }
    }
}
