//! Check command implementation

use std::path::Path;

use colored::Colorize;
use horizon_state::SyncStatus;

use crate::commands::load_config;
use crate::context::{Context, block_on};
use crate::error::{CliError, Result};

/// Run the drift check for the configuration at `config_path`
pub fn run_check(settings: &Path, config_path: &Path, json: bool) -> Result<()> {
    let ctx = Context::load(settings)?;
    let config = load_config(&ctx.settings, config_path)?;

    let status = block_on(ctx.checker().check_sync(&config))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        match &status {
            SyncStatus::InSync => {
                println!("{} Machine matches {}", "✓".green(), config_path.display());
            }
            SyncStatus::OutOfSync(issues) => {
                println!("{}", "Drift detected".yellow().bold());
                println!();
                for issue in issues {
                    println!("  {} {}", "-".red(), issue);
                }
            }
        }
    }

    match status {
        SyncStatus::InSync => Ok(()),
        SyncStatus::OutOfSync(issues) => Err(CliError::user(format!(
            "{} drift issue(s) found",
            issues.len()
        ))),
    }
}
