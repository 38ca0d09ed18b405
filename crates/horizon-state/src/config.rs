//! Compiled system configuration
//!
//! Produced by the configuration compiler as JSON and only ever read here.

use std::path::Path;

use horizon_fs::compute_content_checksum;
use horizon_image::SystemImage;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Declared state of a machine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemConfig {
    /// Required, so an empty object or array is not a configuration
    pub system: SystemIdentity,
    #[serde(default)]
    pub services: Vec<ServiceSpec>,
    #[serde(default)]
    pub packages: Vec<PackageSpec>,
    #[serde(default)]
    pub users: Vec<UserSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<SystemImage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemIdentity {
    pub hostname: String,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_locale")]
    pub locale: String,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_locale() -> String {
    "en_US.UTF-8".to_string()
}

impl Default for SystemIdentity {
    fn default() -> Self {
        Self {
            hostname: "horizonos".to_string(),
            timezone: default_timezone(),
            locale: default_locale(),
        }
    }
}

/// A service and whether it should be enabled at boot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSpec {
    pub name: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageAction {
    #[default]
    Install,
    Remove,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageSpec {
    pub name: String,
    #[serde(default)]
    pub action: PackageAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home: Option<String>,
}

impl SystemConfig {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            system: SystemIdentity {
                hostname: hostname.into(),
                ..SystemIdentity::default()
            },
            ..Self::default()
        }
    }

    pub fn with_service(mut self, name: impl Into<String>, enabled: bool) -> Self {
        self.services.push(ServiceSpec {
            name: name.into(),
            enabled,
        });
        self
    }

    pub fn with_package(mut self, name: impl Into<String>, action: PackageAction) -> Self {
        self.packages.push(PackageSpec {
            name: name.into(),
            action,
        });
        self
    }

    pub fn with_user(mut self, user: UserSpec) -> Self {
        self.users.push(user);
        self
    }

    /// Packages the configuration wants installed.
    pub fn install_packages(&self) -> impl Iterator<Item = &str> {
        self.packages
            .iter()
            .filter(|p| p.action == PackageAction::Install)
            .map(|p| p.name.as_str())
    }

    /// `sha256:` checksum of the configuration's JSON form.
    pub fn checksum(&self) -> Result<String> {
        Ok(compute_content_checksum(serde_json::to_vec(self)?))
    }

    pub fn load(path: &Path) -> Result<Self> {
        Ok(horizon_fs::io::read_json(path)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        Ok(horizon_fs::io::write_json(path, self)?)
    }
}

impl UserSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uid: None,
            shell: None,
            groups: Vec::new(),
            home: None,
        }
    }
}
