//! multicommit: distribute one file into many git working trees.
//!
//! # Usage
//!
//! ```text
//! multicommit list <ROOT> [--json]
//! multicommit diff --root <ROOT> --update <FILE> --target <FILE>
//! multicommit run --root <ROOT> --update <FILE> --target <FILE> [--debug] [--exclude NAME]... [--yes] [--json]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{diff::DiffArgs, list::ListArgs, run::RunArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "multicommit",
    version,
    about = "Copy one file into many repositories, then commit and push it",
    long_about = None,
)]
struct Cli {
    /// Log progress to stderr (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the projects under a root directory with their branches.
    List(ListArgs),

    /// Show what copying the update file would change in each project.
    Diff(DiffArgs),

    /// Copy the update file, then commit and push it after confirmation.
    Run(RunArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::List(args) => args.run(),
        Commands::Diff(args) => args.run(),
        Commands::Run(args) => args.run(),
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let fallback = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
