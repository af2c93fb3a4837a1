//! `multicommit diff`: show what copying the update file would change.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use multicommit_batch::PreviewKind;

use super::{load_settings, open_batch, BatchArgs};

/// Arguments for `multicommit diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    #[command(flatten)]
    pub paths: BatchArgs,
}

impl DiffArgs {
    pub fn run(self) -> Result<()> {
        let batch = open_batch(self.paths.context(load_settings()?))?;
        let previews = batch.preview().context("preview failed")?;

        for preview in previews {
            let name = preview.project.to_string().bold();
            match preview.kind {
                PreviewKind::Diff(diff) => {
                    println!("{name}");
                    print!("{diff}");
                    if !diff.ends_with('\n') {
                        println!();
                    }
                }
                PreviewKind::Identical => println!("{name}: {}", "identical".bright_black()),
                PreviewKind::LineEndings => {
                    println!("{name}: {}", "line endings differ".yellow())
                }
                PreviewKind::Missing => println!(
                    "{name}: {} {}",
                    "missing".red(),
                    preview.target.display()
                ),
                PreviewKind::Binary => println!("{name}: {}", "binary files differ".yellow()),
                PreviewKind::Unreadable(err) => println!("{name}: {} {err}", "unreadable".red()),
            }
        }
        Ok(())
    }
}
