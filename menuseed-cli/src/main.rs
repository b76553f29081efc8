//! menuseed: seed and reconcile the restaurant catalog in a hosted
//! document store.
//!
//! # Usage
//!
//! ```text
//! menuseed init --project <id> --database <id> --bucket <id> [--endpoint <url>] [--force]
//! menuseed verify
//! menuseed seed [--dataset <path>] [--skip-clear] [--json]
//! menuseed clear --yes
//! menuseed dataset [--dataset <path>] [--json]
//! menuseed collections
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    clear::ClearArgs, collections::CollectionsArgs, dataset::DatasetArgs, init::InitArgs,
    seed::SeedArgs, verify::VerifyArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "menuseed",
    version,
    about = "Seed and reconcile the catalog in a hosted document store",
    long_about = None,
)]
struct Cli {
    /// Config file to use instead of ~/.menuseed/config.yaml.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log every request and per-item outcome.
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a config template for the seed target.
    Init(InitArgs),

    /// Check that every collection and the bucket are reachable.
    Verify(VerifyArgs),

    /// Clear the target and seed the catalog.
    Seed(SeedArgs),

    /// Delete every seeded document and file without reseeding.
    Clear(ClearArgs),

    /// Summarize and lint a dataset without touching the network.
    Dataset(DatasetArgs),

    /// Show record counts for each configured collection and the bucket.
    Collections(CollectionsArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Init(args) => args.run(config),
        Commands::Verify(args) => args.run(config),
        Commands::Seed(args) => args.run(config),
        Commands::Clear(args) => args.run(config),
        Commands::Dataset(args) => args.run(),
        Commands::Collections(args) => args.run(config),
    }
}

/// `RUST_LOG` wins; otherwise `info`, or `debug` with `--verbose`.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
