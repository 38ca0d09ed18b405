//! Typed queries and mutations of the live machine
//!
//! [`LiveSystem`] turns the narrow [`CommandExecutor`] interface into the
//! handful of operations the snapshot, restore and sync components need.
//! Identity uses `hostnamectl`, `timedatectl` and `localectl`; services use
//! `systemctl`; packages use `pacman`.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::executor::{CommandExecutor, CommandOutput, SystemCommand};
use crate::{Error, Result};

/// Observable identity of the machine, as captured into `system-state.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemState {
    pub hostname: String,
    pub timezone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kernel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime: Option<String>,
    pub captured_at: DateTime<Utc>,
}

/// One systemd service as listed by `systemctl list-units`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceState {
    pub name: String,
    pub loaded: bool,
    pub active: bool,
    pub running: bool,
}

/// Handle on the live machine.
#[derive(Clone)]
pub struct LiveSystem {
    executor: Arc<dyn CommandExecutor>,
    timeout: Duration,
}

impl LiveSystem {
    pub fn new(executor: Arc<dyn CommandExecutor>, timeout: Duration) -> Self {
        Self { executor, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn output(&self, command: SystemCommand) -> Result<(SystemCommand, CommandOutput)> {
        let output = self.executor.run(&command, self.timeout).await?;
        Ok((command, output))
    }

    /// Run a command that must succeed; returns its trimmed stdout.
    async fn checked(&self, command: SystemCommand) -> Result<String> {
        let (command, output) = self.output(command).await?;
        if !output.success() {
            return Err(Error::CommandFailed {
                command: command.to_string(),
                code: output.exit_code,
                stderr: output.stderr.trim().to_string(),
            });
        }
        Ok(output.stdout.trim().to_string())
    }

    pub async fn hostname(&self) -> Result<String> {
        self.checked(SystemCommand::new("hostnamectl").arg("hostname"))
            .await
    }

    pub async fn timezone(&self) -> Result<String> {
        self.checked(
            SystemCommand::new("timedatectl").args(["show", "--property=Timezone", "--value"]),
        )
        .await
    }

    pub async fn locale(&self) -> Result<String> {
        let status = self
            .checked(SystemCommand::new("localectl").arg("status"))
            .await?;
        parse_locale(&status).ok_or_else(|| Error::CommandFailed {
            command: "localectl status".to_string(),
            code: 0,
            stderr: "no System Locale line in output".to_string(),
        })
    }

    pub async fn kernel_version(&self) -> Result<String> {
        self.checked(SystemCommand::new("uname").arg("-r")).await
    }

    pub async fn uptime(&self) -> Result<String> {
        self.checked(SystemCommand::new("uptime").arg("-p")).await
    }

    /// Capture the machine identity.
    ///
    /// Hostname and timezone are required; locale, kernel and uptime are
    /// informational and a failure to read them is returned as a warning.
    pub async fn system_state(&self) -> Result<(SystemState, Vec<String>)> {
        let (hostname, timezone, locale, kernel, uptime) = tokio::join!(
            self.hostname(),
            self.timezone(),
            self.locale(),
            self.kernel_version(),
            self.uptime(),
        );

        let mut warnings = Vec::new();
        let mut optional = |field: &str, value: Result<String>| match value {
            Ok(v) => Some(v),
            Err(e) => {
                warnings.push(format!("Could not read {field}: {e}"));
                None
            }
        };
        let locale = optional("locale", locale);
        let kernel = optional("kernel version", kernel);
        let uptime = optional("uptime", uptime);

        let state = SystemState {
            hostname: hostname?,
            timezone: timezone?,
            locale,
            kernel,
            uptime,
            captured_at: Utc::now(),
        };
        Ok((state, warnings))
    }

    /// Whether `service` is enabled at boot.
    ///
    /// `systemctl is-enabled` exits non-zero for disabled and unknown units;
    /// both count as not enabled.
    pub async fn is_service_enabled(&self, service: &str) -> Result<bool> {
        let (_, output) = self
            .output(SystemCommand::new("systemctl").args(["is-enabled", service]))
            .await?;
        Ok(matches!(
            output.stdout.trim(),
            "enabled" | "enabled-runtime" | "alias"
        ))
    }

    pub async fn services(&self) -> Result<Vec<ServiceState>> {
        let listing = self
            .checked(SystemCommand::new("systemctl").args([
                "list-units",
                "--type=service",
                "--all",
                "--no-legend",
                "--no-pager",
                "--plain",
            ]))
            .await?;
        Ok(parse_service_units(&listing))
    }

    /// Names of every installed package.
    pub async fn installed_packages(&self) -> Result<Vec<String>> {
        let listing = self.checked(SystemCommand::new("pacman").arg("-Qq")).await?;
        Ok(listing
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect())
    }

    pub async fn set_hostname(&self, hostname: &str) -> Result<()> {
        self.checked(SystemCommand::new("hostnamectl").args(["set-hostname", hostname]))
            .await
            .map(drop)
    }

    pub async fn set_timezone(&self, timezone: &str) -> Result<()> {
        self.checked(SystemCommand::new("timedatectl").args(["set-timezone", timezone]))
            .await
            .map(drop)
    }

    pub async fn start_service(&self, service: &str) -> Result<()> {
        self.checked(SystemCommand::new("systemctl").args(["start", service]))
            .await
            .map(drop)
    }

    pub async fn stop_service(&self, service: &str) -> Result<()> {
        self.checked(SystemCommand::new("systemctl").args(["stop", service]))
            .await
            .map(drop)
    }
}

/// Extract `LANG` from `localectl status` output.
fn parse_locale(status: &str) -> Option<String> {
    let line = status
        .lines()
        .find_map(|l| l.trim().strip_prefix("System Locale:"))?;
    let value = line.trim();
    let lang = value
        .split_whitespace()
        .find_map(|kv| kv.strip_prefix("LANG="))
        .unwrap_or(value);
    (!lang.is_empty()).then(|| lang.to_string())
}

/// Parse `systemctl list-units --plain --no-legend` lines:
/// `UNIT LOAD ACTIVE SUB DESCRIPTION...`
fn parse_service_units(listing: &str) -> Vec<ServiceState> {
    listing
        .lines()
        .filter_map(|line| {
            let mut fields = line
                .split_whitespace()
                .skip_while(|f| *f == "●" || *f == "*");
            let unit = fields.next()?;
            let load = fields.next()?;
            let active = fields.next()?;
            let sub = fields.next()?;
            let name = unit.strip_suffix(".service").unwrap_or(unit);
            Some(ServiceState {
                name: name.to_string(),
                loaded: load == "loaded",
                active: active == "active",
                running: sub == "running",
            })
        })
        .collect()
}
