//! System image value types
//!
//! A [`SystemImage`] is the unit of desired state: one immutable OSTree base
//! commit plus containers, Flatpak applications and layered overlays. Values
//! are built once and never mutated; a change produces a new image that is
//! diffed against the previous one.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Result;

/// Desired state of a whole machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemImage {
    /// Semantic version of this image
    pub version: String,
    /// When the image was compiled
    pub timestamp: DateTime<Utc>,
    /// The single base OS commit
    pub base: OstreeImage,
    #[serde(default)]
    pub containers: Vec<ContainerImage>,
    #[serde(default)]
    pub flatpaks: Vec<FlatpakImage>,
    #[serde(default)]
    pub layers: Vec<LayerImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl SystemImage {
    /// Create an image with no containers, Flatpaks or layers.
    pub fn new(version: impl Into<String>, base: OstreeImage) -> Self {
        Self {
            version: version.into(),
            timestamp: Utc::now(),
            base,
            containers: Vec::new(),
            flatpaks: Vec::new(),
            layers: Vec::new(),
            signature: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_container(mut self, container: ContainerImage) -> Self {
        self.containers.push(container);
        self
    }

    pub fn with_flatpak(mut self, flatpak: FlatpakImage) -> Self {
        self.flatpaks.push(flatpak);
        self
    }

    pub fn with_layer(mut self, layer: LayerImage) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn container(&self, name: &str) -> Option<&ContainerImage> {
        self.containers.iter().find(|c| c.name == name)
    }

    pub fn flatpak(&self, id: &str) -> Option<&FlatpakImage> {
        self.flatpaks.iter().find(|f| f.id == id)
    }

    pub fn layer(&self, name: &str) -> Option<&LayerImage> {
        self.layers.iter().find(|l| l.name == name)
    }

    /// Content-addressing digest of this image.
    ///
    /// See [`crate::checksum`].
    pub fn checksum(&self) -> Result<String> {
        crate::digest::checksum(self)
    }

    /// Load an image from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        Ok(horizon_fs::io::read_json(path)?)
    }

    /// Save the image as JSON, atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        Ok(horizon_fs::io::write_json(path, self)?)
    }
}

/// Immutable base-system reference.
///
/// Identity is the `(ref, commit)` pair; `digest` is the content key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OstreeImage {
    #[serde(rename = "ref")]
    pub reference: String,
    pub commit: String,
    #[serde(default)]
    pub version: String,
    pub digest: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl OstreeImage {
    pub fn new(
        reference: impl Into<String>,
        commit: impl Into<String>,
        digest: impl Into<String>,
    ) -> Self {
        Self {
            reference: reference.into(),
            commit: commit.into(),
            version: String::new(),
            digest: digest.into(),
            url: None,
            signature: None,
            size: None,
            timestamp: None,
        }
    }

    /// The `(ref, commit)` identity pair.
    pub fn identity(&self) -> (&str, &str) {
        (&self.reference, &self.commit)
    }
}

/// Container runtime a [`ContainerImage`] is deployed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerRuntime {
    #[default]
    Podman,
    Docker,
    Toolbox,
    Distrobox,
}

impl std::fmt::Display for ContainerRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Podman => write!(f, "podman"),
            Self::Docker => write!(f, "docker"),
            Self::Toolbox => write!(f, "toolbox"),
            Self::Distrobox => write!(f, "distrobox"),
        }
    }
}

/// A container image, keyed by `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerImage {
    pub name: String,
    pub image: String,
    #[serde(default = "default_tag")]
    pub tag: String,
    pub digest: String,
    #[serde(default)]
    pub runtime: ContainerRuntime,
    #[serde(default)]
    pub purpose: String,
    /// Packages installed into the container, in install order
    #[serde(default)]
    pub packages: Vec<PackageInfo>,
    /// Parent layer digests, base first
    #[serde(default)]
    pub layers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

fn default_tag() -> String {
    "latest".to_string()
}

impl ContainerImage {
    pub fn new(
        name: impl Into<String>,
        image: impl Into<String>,
        digest: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            tag: default_tag(),
            digest: digest.into(),
            runtime: ContainerRuntime::default(),
            purpose: String::new(),
            packages: Vec::new(),
            layers: Vec::new(),
            signature: None,
        }
    }

    /// `image:tag` reference
    pub fn image_ref(&self) -> String {
        format!("{}:{}", self.image, self.tag)
    }
}

/// A Flatpak application, keyed by `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatpakImage {
    pub id: String,
    #[serde(default)]
    pub version: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    pub commit: String,
    #[serde(default)]
    pub runtime: String,
    #[serde(default)]
    pub runtime_version: String,
    #[serde(default)]
    pub download_size: u64,
    #[serde(default)]
    pub installed_size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

fn default_branch() -> String {
    "stable".to_string()
}

impl FlatpakImage {
    pub fn new(id: impl Into<String>, commit: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: String::new(),
            branch: default_branch(),
            commit: commit.into(),
            runtime: String::new(),
            runtime_version: String::new(),
            download_size: 0,
            installed_size: 0,
            signature: None,
        }
    }
}

/// An overlay composed on top of the base image, keyed by `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerImage {
    pub name: String,
    #[serde(default)]
    pub purpose: String,
    pub image: ContainerImage,
    /// Names of layers that must deploy before this one
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Lower deploys first among layers whose dependencies are met
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub checksum: String,
}

impl LayerImage {
    pub fn new(name: impl Into<String>, image: ContainerImage) -> Self {
        Self {
            name: name.into(),
            purpose: String::new(),
            image,
            dependencies: Vec::new(),
            priority: 0,
            checksum: String::new(),
        }
    }

    pub fn depends_on(mut self, layer: impl Into<String>) -> Self {
        self.dependencies.push(layer.into());
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// Provenance record of a package inside a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageInfo {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub architecture: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub checksum: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub origin: String,
}
