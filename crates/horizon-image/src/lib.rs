//! System image model for HorizonOS
//!
//! A [`SystemImage`] describes what a machine should be. This crate
//! provides:
//!
//! - **Model**: immutable value types for the base commit, containers,
//!   Flatpaks, layers and package provenance
//! - **Validation**: advisory integrity rules, applied under a
//!   [`ValidationMode`]
//! - **Digest**: a deterministic `sha256:` content address for an image
//! - **Diff**: the keyed delta between two images
//! - **Ordering**: the deployment order of layers

pub mod diff;
pub mod digest;
pub mod error;
pub mod model;
pub mod order;
pub mod validate;

pub use diff::{Change, ChangeType, SystemImageDiff, compare};
pub use digest::checksum;
pub use error::{Error, Result};
pub use model::{
    ContainerImage, ContainerRuntime, FlatpakImage, LayerImage, OstreeImage, PackageInfo,
    SystemImage,
};
pub use order::deployment_order;
pub use validate::{ValidationMode, validate};
