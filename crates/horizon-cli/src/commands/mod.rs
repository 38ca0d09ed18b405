//! Command implementations for horizon-cli

pub mod check;
pub mod image;
pub mod snapshot;
pub mod state;

pub use check::run_check;
pub use image::{run_image_diff, run_image_digest, run_image_order, run_image_validate};
pub use snapshot::{
    run_snapshot_cleanup, run_snapshot_create, run_snapshot_list, run_snapshot_restore,
};
pub use state::{run_state_record, run_state_show};

use std::path::Path;

use horizon_state::{HorizonSettings, SystemConfig};

use crate::error::{CliError, Result};

/// Load a compiled configuration and apply the configured validation mode
/// to its image, if it carries one.
fn load_config(settings: &HorizonSettings, path: &Path) -> Result<SystemConfig> {
    let config = SystemConfig::load(path)
        .map_err(|e| CliError::user(format!("Cannot read configuration {}: {e}", path.display())))?;

    if let Some(image) = &config.image {
        settings.validation_mode.enforce(image)?;
    }
    Ok(config)
}
