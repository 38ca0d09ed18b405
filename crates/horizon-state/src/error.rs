//! Error types for horizon-state

use std::path::PathBuf;
use std::time::Duration;

/// Result type for horizon-state operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in horizon-state operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A snapshot cannot be restored because required files are absent
    /// or unreadable
    #[error("State sync failed for snapshot {snapshot_id}: {message}")]
    StateSync {
        snapshot_id: String,
        message: String,
        #[source]
        source: Option<Box<Error>>,
    },

    /// No snapshot with this id exists in the state directory
    #[error("Snapshot not found: {id}")]
    SnapshotNotFound { id: String },

    /// An external command exceeded its timeout and was killed
    #[error("Command '{command}' timed out after {timeout:?}")]
    CommandTimeout { command: String, timeout: Duration },

    /// An external command could not be started or awaited
    #[error("Failed to run '{command}': {source}")]
    CommandSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// An external command exited unsuccessfully
    #[error("Command '{command}' failed (exit code {code}): {stderr}")]
    CommandFailed {
        command: String,
        code: i32,
        stderr: String,
    },

    /// Settings file exists but cannot be parsed
    #[error("Invalid settings at {path}: {message}")]
    Settings { path: PathBuf, message: String },

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from horizon-fs
    #[error(transparent)]
    Fs(#[from] horizon_fs::Error),

    /// Image error from horizon-image
    #[error(transparent)]
    Image(#[from] horizon_image::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Build a [`Error::StateSync`] for `snapshot_id`.
    pub fn state_sync(
        snapshot_id: impl Into<String>,
        message: impl Into<String>,
        source: Option<Error>,
    ) -> Self {
        Self::StateSync {
            snapshot_id: snapshot_id.into(),
            message: message.into(),
            source: source.map(Box::new),
        }
    }
}
