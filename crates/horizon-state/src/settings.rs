//! Reconciler settings
//!
//! Read from a TOML file. Every field has a default, so a missing file or a
//! partial file is valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use horizon_fs::StateLayout;
use horizon_image::ValidationMode;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default location of the settings file
pub const DEFAULT_SETTINGS_PATH: &str = "/etc/horizonos/horizon.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HorizonSettings {
    /// Root of `current-state.json` and the snapshot directories
    pub state_dir: PathBuf,
    /// Reserved for the applied-image pointer; never written
    pub lock_file: PathBuf,
    /// Timeout applied to every external command
    pub command_timeout_secs: u64,
    pub validation_mode: ValidationMode,
    /// Snapshots kept by cleanup when no explicit count is given
    pub snapshot_retention: usize,
}

impl Default for HorizonSettings {
    fn default() -> Self {
        Self {
            state_dir: PathBuf::from("/var/lib/horizonos/state"),
            lock_file: PathBuf::from("/etc/horizonos/system.lock"),
            command_timeout_secs: 30,
            validation_mode: ValidationMode::default(),
            snapshot_retention: 10,
        }
    }
}

impl HorizonSettings {
    /// Load settings from `path`, falling back to defaults when the file
    /// does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Settings`] if the file exists but is not valid TOML
    /// for this schema.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No settings file, using defaults");
            return Ok(Self::default());
        }

        let content = horizon_fs::io::read_text(path)?;
        toml::from_str(&content).map_err(|e| Error::Settings {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    pub fn layout(&self) -> StateLayout {
        StateLayout::new(&self.state_dir)
    }
}
