//! Filesystem layer for the HorizonOS reconciliation core
//!
//! Provides the state-directory layout, crash-safe I/O and the canonical
//! `sha256:` checksum format shared by the image and state crates.

pub mod checksum;
pub mod error;
pub mod io;
pub mod layout;

pub use checksum::{compute_content_checksum, compute_file_checksum, is_sha256_digest};
pub use error::{Error, Result};
pub use io::FileLock;
pub use layout::{SnapshotName, StateFile, StateLayout};
