//! Snapshots of the live machine
//!
//! A snapshot is a directory `snapshot-<id>` under the state root holding
//! `config.json`, `system-state.json`, `services.json` and `packages.txt`.
//! Capture steps are independent: a step that fails leaves its file out and
//! adds a warning, and the snapshot is still kept.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use horizon_fs::layout::SNAPSHOT_PREFIX;
use horizon_fs::{SnapshotName, StateFile, StateLayout, io};
use serde::{Deserialize, Serialize};

use crate::inspect::LiveSystem;
use crate::store::StateStore;
use crate::{Error, Result};

/// A snapshot on disk.
///
/// The file paths are where the snapshot's files belong; use
/// [`StateSnapshot::missing_files`] to find out which were captured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub config_path: PathBuf,
    pub system_state_path: PathBuf,
    pub services_path: PathBuf,
    pub packages_path: PathBuf,
}

impl StateSnapshot {
    fn at(layout: &StateLayout, name: &SnapshotName) -> Self {
        Self {
            id: name.id().to_string(),
            timestamp: name.timestamp(),
            config_path: layout.snapshot_file(name, StateFile::Config),
            system_state_path: layout.snapshot_file(name, StateFile::SystemState),
            services_path: layout.snapshot_file(name, StateFile::Services),
            packages_path: layout.snapshot_file(name, StateFile::Packages),
        }
    }

    pub fn path(&self, file: StateFile) -> Option<&Path> {
        match file {
            StateFile::Config => Some(self.config_path.as_path()),
            StateFile::SystemState => Some(self.system_state_path.as_path()),
            StateFile::Services => Some(self.services_path.as_path()),
            StateFile::Packages => Some(self.packages_path.as_path()),
            _ => None,
        }
    }

    /// Snapshot files that were not captured.
    pub fn missing_files(&self) -> Vec<StateFile> {
        StateFile::SNAPSHOT_FILES
            .into_iter()
            .filter(|f| self.path(*f).is_some_and(|p| !p.exists()))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_files().is_empty()
    }
}

/// Summary of one snapshot directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotInfo {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub path: PathBuf,
}

/// Outcome of [`SnapshotManager::create_snapshot`].
#[derive(Debug, Clone)]
pub struct SnapshotReport {
    pub snapshot: StateSnapshot,
    /// One entry per capture step that failed or was skipped
    pub warnings: Vec<String>,
}

/// Outcome of [`SnapshotManager::cleanup_snapshots`].
#[derive(Debug, Clone, Default)]
pub struct CleanupReport {
    pub removed: Vec<String>,
    /// `(id, error)` for snapshots that could not be deleted
    pub failed: Vec<(String, String)>,
}

pub struct SnapshotManager {
    store: Arc<StateStore>,
    live: LiveSystem,
}

impl SnapshotManager {
    pub fn new(store: Arc<StateStore>, live: LiveSystem) -> Self {
        Self { store, live }
    }

    fn layout(&self) -> &StateLayout {
        self.store.layout()
    }

    /// Capture the live machine into a new snapshot directory.
    ///
    /// # Errors
    ///
    /// Fails only when the snapshot directory or one of its files cannot be
    /// written. Capture failures are reported as warnings.
    pub async fn create_snapshot(&self) -> Result<SnapshotReport> {
        let name = self.allocate()?;
        let snapshot = StateSnapshot::at(self.layout(), &name);
        let mut warnings = Vec::new();

        match self.store.last_synced_config() {
            Some(config) => io::write_json(&snapshot.config_path, &*config)?,
            None => warnings.push("No synced configuration yet; config.json not written".to_string()),
        }

        let (system, services, packages) = tokio::join!(
            self.live.system_state(),
            self.live.services(),
            self.live.installed_packages(),
        );

        match system {
            Ok((state, partial)) => {
                io::write_json(&snapshot.system_state_path, &state)?;
                warnings.extend(partial);
            }
            Err(e) => warnings.push(format!("System state not captured: {e}")),
        }

        match services {
            Ok(services) => io::write_json(&snapshot.services_path, &services)?,
            Err(e) => warnings.push(format!("Service states not captured: {e}")),
        }

        match packages {
            Ok(packages) => {
                let mut listing = packages.join("\n");
                listing.push('\n');
                io::write_text(&snapshot.packages_path, &listing)?;
            }
            Err(e) => warnings.push(format!("Package list not captured: {e}")),
        }

        for warning in &warnings {
            tracing::warn!(snapshot = %snapshot.id, "{}", warning);
        }
        tracing::info!(snapshot = %snapshot.id, warnings = warnings.len(), "Snapshot created");

        Ok(SnapshotReport { snapshot, warnings })
    }

    /// Create a fresh snapshot directory, stepping past names already taken.
    fn allocate(&self) -> Result<SnapshotName> {
        let root = self.layout().root();
        fs::create_dir_all(root).map_err(|e| horizon_fs::Error::io(root, e))?;

        let mut name = SnapshotName::from_timestamp(Utc::now());
        loop {
            let dir = self.layout().snapshot_dir(&name);
            match fs::create_dir(&dir) {
                Ok(()) => return Ok(name),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    tracing::debug!(snapshot = %name, "Snapshot name taken, trying next");
                    name = name.next();
                }
                Err(e) => return Err(horizon_fs::Error::io(dir, e).into()),
            }
        }
    }

    /// All snapshots, newest first.
    ///
    /// Directories whose name does not parse as a snapshot are skipped.
    pub fn list_snapshots(&self) -> Result<Vec<SnapshotInfo>> {
        let root = self.layout().root();
        let entries = match fs::read_dir(root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(horizon_fs::Error::io(root, e).into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(dir = %root.display(), error = %e, "Skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_ok_and(|t| t.is_dir()) {
                continue;
            }
            let file_name = entry.file_name();
            let Some(dir_name) = file_name.to_str() else {
                continue;
            };
            if !dir_name.starts_with(SNAPSHOT_PREFIX) {
                continue;
            }
            match SnapshotName::from_dir_name(dir_name) {
                Ok(name) => names.push(name),
                Err(_) => tracing::warn!(dir = dir_name, "Skipping malformed snapshot directory"),
            }
        }

        names.sort_by(|a, b| b.cmp(a));
        Ok(names
            .into_iter()
            .map(|name| SnapshotInfo {
                id: name.id().to_string(),
                timestamp: name.timestamp(),
                path: self.layout().snapshot_dir(&name),
            })
            .collect())
    }

    /// Look up a snapshot by id.
    ///
    /// # Errors
    ///
    /// [`Error::SnapshotNotFound`] if the id is malformed or no such
    /// directory exists.
    pub fn load_snapshot(&self, id: &str) -> Result<StateSnapshot> {
        let not_found = || Error::SnapshotNotFound { id: id.to_string() };
        let name = SnapshotName::from_id(id).map_err(|_| not_found())?;
        if !self.layout().snapshot_dir(&name).is_dir() {
            return Err(not_found());
        }
        Ok(StateSnapshot::at(self.layout(), &name))
    }

    /// Delete all but the newest `keep` snapshots.
    ///
    /// Each deletion is attempted independently; failures are collected in
    /// the report rather than stopping the cleanup.
    pub fn cleanup_snapshots(&self, keep: usize) -> Result<CleanupReport> {
        let mut report = CleanupReport::default();
        for info in self.list_snapshots()?.into_iter().skip(keep) {
            match fs::remove_dir_all(&info.path) {
                Ok(()) => {
                    tracing::debug!(snapshot = %info.id, "Removed snapshot");
                    report.removed.push(info.id);
                }
                Err(e) => {
                    tracing::warn!(snapshot = %info.id, error = %e, "Failed to remove snapshot");
                    report.failed.push((info.id, e.to_string()));
                }
            }
        }
        tracing::info!(
            removed = report.removed.len(),
            failed = report.failed.len(),
            kept = keep,
            "Snapshot cleanup finished"
        );
        Ok(report)
    }
}
