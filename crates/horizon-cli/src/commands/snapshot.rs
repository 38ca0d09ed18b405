//! Snapshot commands

use std::path::Path;

use colored::Colorize;

use crate::context::{Context, block_on};
use crate::error::{CliError, Result};

/// Capture the live machine into a new snapshot
pub fn run_snapshot_create(settings: &Path) -> Result<()> {
    let ctx = Context::load(settings)?;
    let report = block_on(ctx.snapshots().create_snapshot())??;
    let snapshot = &report.snapshot;

    println!("{} Created snapshot {}", "✓".green(), snapshot.id.cyan());
    if let Some(dir) = snapshot.config_path.parent() {
        println!("{}: {}", "Path".dimmed(), dir.display());
    }

    if !report.warnings.is_empty() {
        println!();
        println!("{}:", "Warnings".yellow().bold());
        for warning in &report.warnings {
            println!("  {} {}", "!".yellow(), warning);
        }
    }
    Ok(())
}

/// List snapshots, newest first
pub fn run_snapshot_list(settings: &Path, json: bool) -> Result<()> {
    let ctx = Context::load(settings)?;
    let snapshots = ctx.snapshots().list_snapshots()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshots)?);
        return Ok(());
    }

    if snapshots.is_empty() {
        println!("{}", "No snapshots".dimmed());
        return Ok(());
    }

    println!("{}", "Snapshots".bold());
    println!();
    for snapshot in &snapshots {
        println!(
            "  {}  {}",
            snapshot.id.cyan(),
            snapshot.timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string().dimmed()
        );
    }
    Ok(())
}

/// Re-apply the snapshot `id`
pub fn run_snapshot_restore(settings: &Path, id: &str) -> Result<()> {
    let ctx = Context::load(settings)?;
    let snapshot = ctx.snapshots().load_snapshot(id)?;
    let report = block_on(ctx.restorer().restore_snapshot(&snapshot))??;

    println!("{} Restored snapshot {}", "✓".green(), report.snapshot_id.cyan());
    for action in &report.actions {
        println!("  {} {}", "+".green(), action);
    }
    for warning in &report.warnings {
        println!("  {} {}", "!".yellow(), warning);
    }
    Ok(())
}

/// Delete all but the newest `keep` snapshots
pub fn run_snapshot_cleanup(settings: &Path, keep: Option<usize>) -> Result<()> {
    let ctx = Context::load(settings)?;
    let keep = keep.unwrap_or(ctx.settings.snapshot_retention);
    let report = ctx.snapshots().cleanup_snapshots(keep)?;

    println!(
        "{} Removed {} snapshot(s), kept up to {}",
        "✓".green(),
        report.removed.len(),
        keep
    );
    for id in &report.removed {
        println!("  {} {}", "-".red(), id);
    }

    if report.failed.is_empty() {
        return Ok(());
    }
    for (id, error) in &report.failed {
        println!("  {} {}: {}", "!".yellow(), id, error);
    }
    Err(CliError::user(format!(
        "{} snapshot(s) could not be removed",
        report.failed.len()
    )))
}
