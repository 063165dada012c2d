use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod output;

#[derive(Parser)]
#[command(
    name = "cohort",
    version,
    about = "Read-only introspection of curated research datasets"
)]
struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    format: output::OutputFormat,

    /// Dataset root (default: $COHORT_DATASET_ROOT, then the current directory)
    #[arg(long, global = true, env = "COHORT_DATASET_ROOT")]
    dataset_root: Option<PathBuf>,

    #[command(subcommand)]
    command: commands::Commands,
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let root = cohort_core::layout::resolve_dataset_root(cli.dataset_root.as_deref());
    tracing::debug!(root = %root.display(), "dispatching command");

    match &cli.command {
        commands::Commands::Info(args) => commands::info::run(&root, args, cli.format),
        commands::Commands::Status(args) => commands::status::run(&root, args, cli.format),
        commands::Commands::Pipelines => commands::pipelines::run(&root, cli.format),
        commands::Commands::Navigate(args) => commands::navigate::run(&root, args, cli.format),
        commands::Commands::Config => commands::config::run(&root),
        commands::Commands::Manifest(args) => commands::manifest::run(&root, args),
        commands::Commands::Mcp => commands::mcp::run(&root),
    }
}
