//! State directory layout
//!
//! ```text
//! <state_dir>/
//!   current-state.json          flat string map of the last sync
//!   last-config.json            configuration that produced the last sync
//!   .current-state.lock         writer lock for the two files above
//!   snapshot-<id>/
//!     config.json
//!     system-state.json
//!     services.json
//!     packages.txt
//! ```
//!
//! Snapshot ids are UTC ISO-8601 timestamps with `-` in place of `:` so
//! they sort lexically, are filesystem safe and parse back unambiguously.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, TimeDelta, Timelike, Utc};

use crate::{Error, Result};

/// Directory name prefix of every snapshot
pub const SNAPSHOT_PREFIX: &str = "snapshot-";

/// Format of the snapshot id token
const ID_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.6fZ";

/// Well-known files inside the state directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateFile {
    /// Flat key/value record of the last sync
    CurrentState,
    /// Full configuration of the last sync
    LastConfig,
    /// Advisory lock serializing state writers
    StoreLock,
    /// Snapshot copy of the last synced configuration
    Config,
    /// Snapshot of hostname, timezone, locale, kernel and uptime
    SystemState,
    /// Snapshot of every service unit's state
    Services,
    /// Snapshot of installed package names, one per line
    Packages,
}

impl StateFile {
    /// Files every complete snapshot contains, in capture order.
    pub const SNAPSHOT_FILES: [StateFile; 4] = [
        StateFile::Config,
        StateFile::SystemState,
        StateFile::Services,
        StateFile::Packages,
    ];

    /// Get the file name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CurrentState => "current-state.json",
            Self::LastConfig => "last-config.json",
            Self::StoreLock => ".current-state.lock",
            Self::Config => "config.json",
            Self::SystemState => "system-state.json",
            Self::Services => "services.json",
            Self::Packages => "packages.txt",
        }
    }
}

impl AsRef<Path> for StateFile {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl std::fmt::Display for StateFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identity of a snapshot: its id token and the instant it encodes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotName {
    timestamp: DateTime<Utc>,
    id: String,
}

impl SnapshotName {
    /// Name a snapshot taken at `timestamp`, truncated to microseconds.
    pub fn from_timestamp(timestamp: DateTime<Utc>) -> Self {
        let micros = timestamp.nanosecond() / 1_000 * 1_000;
        let timestamp = timestamp.with_nanosecond(micros).unwrap_or(timestamp);
        Self {
            id: timestamp.format(ID_FORMAT).to_string(),
            timestamp,
        }
    }

    /// Parse a bare snapshot id.
    ///
    /// Only the exact form [`SnapshotName::from_timestamp`] writes is
    /// accepted, so a parsed name always points at the directory it came
    /// from.
    pub fn from_id(id: &str) -> Result<Self> {
        let invalid = || Error::InvalidSnapshotName {
            name: id.to_string(),
        };
        let naive = NaiveDateTime::parse_from_str(id, ID_FORMAT).map_err(|_| invalid())?;
        let name = Self::from_timestamp(naive.and_utc());
        if name.id != id {
            return Err(invalid());
        }
        Ok(name)
    }

    /// Parse a `snapshot-<id>` directory name.
    pub fn from_dir_name(name: &str) -> Result<Self> {
        let id = name
            .strip_prefix(SNAPSHOT_PREFIX)
            .ok_or_else(|| Error::InvalidSnapshotName {
                name: name.to_string(),
            })?;
        Self::from_id(id).map_err(|_| Error::InvalidSnapshotName {
            name: name.to_string(),
        })
    }

    /// The name one microsecond later, used to step past a collision.
    pub fn next(&self) -> Self {
        Self::from_timestamp(self.timestamp + TimeDelta::microseconds(1))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Directory name of this snapshot.
    pub fn dir_name(&self) -> String {
        format!("{}{}", SNAPSHOT_PREFIX, self.id)
    }
}

impl std::fmt::Display for SnapshotName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.id)
    }
}

/// Path resolution for a state directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateLayout {
    root: PathBuf,
}

impl StateLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a top-level state file.
    pub fn file(&self, file: StateFile) -> PathBuf {
        self.root.join(file)
    }

    /// Directory of the named snapshot.
    pub fn snapshot_dir(&self, name: &SnapshotName) -> PathBuf {
        self.root.join(name.dir_name())
    }

    /// Path of a file inside the named snapshot.
    pub fn snapshot_file(&self, name: &SnapshotName, file: StateFile) -> PathBuf {
        self.snapshot_dir(name).join(file)
    }
}
