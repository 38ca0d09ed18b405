//! Shared test utilities for the horizon workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`machine`]: [`FakeMachine`], an in-memory machine behind the
//!   `CommandExecutor` interface
//! - [`fixtures`]: sample images, configurations and state directories

pub mod fixtures;
pub mod machine;

pub use fixtures::{TestStateDir, digest, sample_config, sample_image, sample_machine};
pub use machine::{FakeMachine, Failure};
