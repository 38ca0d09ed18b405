//! Image integrity validation
//!
//! Validation is advisory: [`validate`] returns every violation as data and
//! never fails. [`ValidationMode`] lets the caller decide what a violation
//! means.

use std::collections::HashSet;
use std::str::FromStr;

use horizon_fs::is_sha256_digest;
use serde::{Deserialize, Serialize};

use crate::model::{ContainerImage, SystemImage};
use crate::order::graph_problems;
use crate::{Error, Result};

/// Check every integrity rule and collect the violations.
///
/// An empty list means the image is valid. Rules are independent: a
/// violation never hides another.
pub fn validate(image: &SystemImage) -> Vec<String> {
    let mut violations = Vec::new();

    if semver::Version::parse(&image.version).is_err() {
        violations.push(format!(
            "Image version '{}' is not a valid semantic version",
            image.version
        ));
    }

    let base = &image.base;
    if base.reference.trim().is_empty() {
        violations.push("Base image ref is required".to_string());
    }
    if base.commit.trim().is_empty() {
        violations.push("Base image commit is required".to_string());
    }
    if base.digest.trim().is_empty() {
        violations.push("Base image is missing a digest".to_string());
    } else if !is_sha256_digest(&base.digest) {
        violations.push(format!("Base image has a malformed digest: {}", base.digest));
    }

    let mut names = HashSet::new();
    for container in &image.containers {
        check_container(&format!("Container '{}'", container.name), container, &mut violations);
        if !names.insert(container.name.as_str()) {
            violations.push(format!("Duplicate container name '{}'", container.name));
        }
    }

    let mut ids = HashSet::new();
    for flatpak in &image.flatpaks {
        if flatpak.commit.trim().is_empty() {
            violations.push(format!("Flatpak '{}' is missing a commit", flatpak.id));
        }
        if !ids.insert(flatpak.id.as_str()) {
            violations.push(format!("Duplicate Flatpak id '{}'", flatpak.id));
        }
    }

    let mut layer_names = HashSet::new();
    for layer in &image.layers {
        check_container(&format!("Layer '{}' image", layer.name), &layer.image, &mut violations);
        if !layer_names.insert(layer.name.as_str()) {
            violations.push(format!("Duplicate layer name '{}'", layer.name));
        }
    }

    let problems = graph_problems(&image.layers);
    for (layer, dependency) in problems.unknown {
        violations.push(format!(
            "Layer '{}' depends on unknown layer '{}'",
            layer, dependency
        ));
    }
    if !problems.cyclic.is_empty() {
        violations.push(format!(
            "Layer dependency cycle detected among: {}",
            problems.cyclic.join(", ")
        ));
    }

    violations
}

/// Blank and malformed digests are distinct violations.
fn check_container(label: &str, container: &ContainerImage, violations: &mut Vec<String>) {
    if container.digest.trim().is_empty() {
        violations.push(format!("{label} is missing a digest"));
    } else if !is_sha256_digest(&container.digest) {
        violations.push(format!("{label} has a malformed digest: {}", container.digest));
    }
}

/// How a caller treats validation violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Any violation aborts the operation
    Strict,
    /// Violations are logged and the operation continues
    #[default]
    Warn,
    /// Validation is skipped entirely
    Disabled,
}

impl ValidationMode {
    /// Validate `image` under this mode.
    ///
    /// Returns the violations that were tolerated (always empty for
    /// `Disabled`).
    ///
    /// # Errors
    ///
    /// In `Strict` mode, returns [`Error::Validation`] when any rule fails.
    pub fn enforce(self, image: &SystemImage) -> Result<Vec<String>> {
        match self {
            Self::Disabled => Ok(Vec::new()),
            Self::Warn => {
                let violations = validate(image);
                for violation in &violations {
                    tracing::warn!(version = %image.version, "{}", violation);
                }
                Ok(violations)
            }
            Self::Strict => {
                let violations = validate(image);
                if violations.is_empty() {
                    Ok(violations)
                } else {
                    Err(Error::Validation { violations })
                }
            }
        }
    }
}

impl std::fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Strict => write!(f, "strict"),
            Self::Warn => write!(f, "warn"),
            Self::Disabled => write!(f, "disabled"),
        }
    }
}

impl FromStr for ValidationMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "warn" => Ok(Self::Warn),
            "disabled" => Ok(Self::Disabled),
            other => Err(format!(
                "Unknown validation mode '{other}' (expected strict, warn or disabled)"
            )),
        }
    }
}
