//! Drift detection between a configuration and the live machine

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::SystemConfig;
use crate::inspect::LiveSystem;

/// Reported in place of an actual value that could not be inspected.
pub const UNAVAILABLE: &str = "unavailable";

/// One mismatch between declared and live state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncIssue {
    /// `system`, `service` or `package`
    pub component: String,
    /// The attribute or item that differs
    pub field: String,
    pub expected: String,
    pub actual: String,
}

impl SyncIssue {
    pub fn new(
        component: impl Into<String>,
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            component: component.into(),
            field: field.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

impl fmt::Display for SyncIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: expected {}, found {}",
            self.component, self.field, self.expected, self.actual
        )
    }
}

/// Result of a drift check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "issues", rename_all = "snake_case")]
pub enum SyncStatus {
    InSync,
    OutOfSync(Vec<SyncIssue>),
}

impl SyncStatus {
    pub fn from_issues(issues: Vec<SyncIssue>) -> Self {
        if issues.is_empty() {
            Self::InSync
        } else {
            Self::OutOfSync(issues)
        }
    }

    pub fn is_in_sync(&self) -> bool {
        matches!(self, Self::InSync)
    }

    pub fn issues(&self) -> &[SyncIssue] {
        match self {
            Self::InSync => &[],
            Self::OutOfSync(issues) => issues,
        }
    }
}

/// Compares a [`SystemConfig`] against the live machine.
///
/// Checking never changes the machine. Every declared item is inspected
/// even after a mismatch is found, and an item that cannot be inspected is
/// reported with the actual value [`UNAVAILABLE`].
pub struct SyncChecker {
    live: LiveSystem,
}

impl SyncChecker {
    pub fn new(live: LiveSystem) -> Self {
        Self { live }
    }

    pub async fn check_sync(&self, config: &SystemConfig) -> SyncStatus {
        let (identity, services, packages) = tokio::join!(
            self.check_identity(config),
            self.check_services(config),
            self.check_packages(config),
        );

        let issues: Vec<SyncIssue> = identity.into_iter().chain(services).chain(packages).collect();
        tracing::info!(issues = issues.len(), "Sync check finished");
        SyncStatus::from_issues(issues)
    }

    async fn check_identity(&self, config: &SystemConfig) -> Vec<SyncIssue> {
        let expected = &config.system.hostname;
        let actual = match self.live.hostname().await {
            Ok(hostname) => hostname,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read hostname");
                UNAVAILABLE.to_string()
            }
        };

        if &actual == expected {
            Vec::new()
        } else {
            vec![SyncIssue::new("system", "hostname", expected, actual)]
        }
    }

    async fn check_services(&self, config: &SystemConfig) -> Vec<SyncIssue> {
        let mut issues = Vec::new();
        for service in &config.services {
            let expected = service.enabled.to_string();
            let actual = match self.live.is_service_enabled(&service.name).await {
                Ok(enabled) => enabled.to_string(),
                Err(e) => {
                    tracing::warn!(service = %service.name, error = %e, "Could not read service state");
                    UNAVAILABLE.to_string()
                }
            };
            if actual != expected {
                issues.push(SyncIssue::new("service", &service.name, expected, actual));
            }
        }
        issues
    }

    async fn check_packages(&self, config: &SystemConfig) -> Vec<SyncIssue> {
        let declared: Vec<&str> = config.install_packages().collect();
        if declared.is_empty() {
            return Vec::new();
        }

        let installed = match self.live.installed_packages().await {
            Ok(installed) => installed,
            Err(e) => {
                tracing::warn!(error = %e, "Could not list installed packages");
                return declared
                    .into_iter()
                    .map(|name| SyncIssue::new("package", name, "installed", UNAVAILABLE))
                    .collect();
            }
        };

        let installed: HashSet<&str> = installed.iter().map(String::as_str).collect();
        declared
            .into_iter()
            .filter(|name| !installed.contains(name))
            .map(|name| SyncIssue::new("package", name, "installed", "missing"))
            .collect()
    }
}
