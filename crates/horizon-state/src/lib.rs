//! Live-system reconciliation for HorizonOS
//!
//! This crate keeps the running machine and its declared configuration
//! in step:
//!
//! - [`StateStore`] records a summary of the last synced configuration
//! - [`SnapshotManager`] captures the machine into a snapshot directory
//! - [`RestoreManager`] re-applies a snapshot
//! - [`SyncChecker`] reports drift between a configuration and the machine
//!
//! All machine access goes through a [`CommandExecutor`], wrapped by
//! [`LiveSystem`].

pub mod config;
pub mod error;
pub mod executor;
pub mod inspect;
pub mod restore;
pub mod settings;
pub mod snapshot;
pub mod store;
pub mod sync;

pub use config::{PackageAction, PackageSpec, ServiceSpec, SystemConfig, SystemIdentity, UserSpec};
pub use error::{Error, Result};
pub use executor::{CommandExecutor, CommandOutput, SystemCommand, SystemCommandExecutor};
pub use inspect::{LiveSystem, ServiceState, SystemState};
pub use restore::{RestoreManager, RestoreReport};
pub use settings::{DEFAULT_SETTINGS_PATH, HorizonSettings};
pub use snapshot::{CleanupReport, SnapshotInfo, SnapshotManager, SnapshotReport, StateSnapshot};
pub use store::{StateMap, StateStore};
pub use sync::{SyncChecker, SyncIssue, SyncStatus};
