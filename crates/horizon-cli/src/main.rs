//! HorizonOS reconciler CLI
//!
//! Snapshot, restore and drift-check the live machine, and inspect system
//! images.

mod cli;
mod commands;
mod context;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cli::{Cli, Commands, ImageAction, SnapshotAction, StateAction};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Some(cmd) => execute_command(&cli.settings, cmd),
        None => {
            println!("{} HorizonOS reconciler", "horizon".green().bold());
            println!();
            println!("Run {} for available commands.", "horizon --help".cyan());
            Ok(())
        }
    }
}

/// Logs go to stderr so `--json` output stays machine readable.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .compact();

    if tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .is_ok()
    {
        tracing::debug!("Verbose mode enabled");
    }
}

fn execute_command(settings: &std::path::Path, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Check { config, json } => commands::run_check(settings, &config, json),
        Commands::State { action } => match action {
            StateAction::Show { json } => commands::run_state_show(settings, json),
            StateAction::Record { config } => commands::run_state_record(settings, &config),
        },
        Commands::Snapshot { action } => match action {
            SnapshotAction::Create => commands::run_snapshot_create(settings),
            SnapshotAction::List { json } => commands::run_snapshot_list(settings, json),
            SnapshotAction::Restore { id } => commands::run_snapshot_restore(settings, &id),
            SnapshotAction::Cleanup { keep } => commands::run_snapshot_cleanup(settings, keep),
        },
        Commands::Image { action } => match action {
            ImageAction::Validate { file } => commands::run_image_validate(&file),
            ImageAction::Digest { file } => commands::run_image_digest(&file),
            ImageAction::Diff { old, new, json } => commands::run_image_diff(&old, &new, json),
            ImageAction::Order { file } => commands::run_image_order(&file),
        },
    }
}
