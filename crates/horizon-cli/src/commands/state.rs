//! State commands

use std::path::Path;

use colored::Colorize;

use crate::commands::load_config;
use crate::context::Context;
use crate::error::Result;

/// Show the state recorded by the last sync
pub fn run_state_show(settings: &Path, json: bool) -> Result<()> {
    let ctx = Context::load(settings)?;
    let state = ctx.store.current_state();

    if json {
        println!("{}", serde_json::to_string_pretty(state.as_ref())?);
        return Ok(());
    }

    if state.is_empty() {
        println!("{}", "No state recorded yet".dimmed());
        println!();
        println!("Run {} to record one.", "horizon state record --config <file>".cyan());
        return Ok(());
    }

    println!("{}", "Recorded State".bold());
    println!();
    for (key, value) in state.iter() {
        println!("{}: {}", key.dimmed(), value);
    }
    Ok(())
}

/// Record the configuration at `config_path` as the last synced one
pub fn run_state_record(settings: &Path, config_path: &Path) -> Result<()> {
    let ctx = Context::load(settings)?;
    let config = load_config(&ctx.settings, config_path)?;

    let state = ctx.store.sync_state(&config)?;

    println!(
        "{} Recorded {} ({})",
        "✓".green(),
        config.system.hostname.cyan(),
        state
            .get(horizon_state::store::keys::CONFIG_HASH)
            .map(String::as_str)
            .unwrap_or_default()
    );
    Ok(())
}
