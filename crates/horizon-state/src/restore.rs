//! Re-applying a snapshot to the live machine

use std::sync::Arc;

use horizon_fs::io;

use crate::config::SystemConfig;
use crate::inspect::{LiveSystem, ServiceState, SystemState};
use crate::snapshot::StateSnapshot;
use crate::store::StateStore;
use crate::{Error, Result};

/// Outcome of [`RestoreManager::restore_snapshot`].
#[derive(Debug, Clone, Default)]
pub struct RestoreReport {
    pub snapshot_id: String,
    /// Changes applied to the machine
    pub actions: Vec<String>,
    /// Steps that failed or were skipped
    pub warnings: Vec<String>,
}

impl RestoreReport {
    fn record(&mut self, action: String, result: Result<()>) {
        match result {
            Ok(()) => self.actions.push(action),
            Err(e) => {
                tracing::warn!(snapshot = %self.snapshot_id, error = %e, "{} failed", action);
                self.warnings.push(format!("{action} failed: {e}"));
            }
        }
    }
}

pub struct RestoreManager {
    store: Arc<StateStore>,
    live: LiveSystem,
}

impl RestoreManager {
    pub fn new(store: Arc<StateStore>, live: LiveSystem) -> Self {
        Self { store, live }
    }

    /// Apply `snapshot` to the machine and record its configuration as the
    /// last synced one.
    ///
    /// Hostname and timezone are set, and when the snapshot has a service
    /// list its active services are started and the rest stopped. The
    /// package list is never applied; installing or removing packages
    /// needs an operator.
    ///
    /// # Errors
    ///
    /// [`Error::StateSync`] if the snapshot's configuration or system state
    /// is missing or unreadable; nothing is applied in that case. Errors
    /// writing the state store are returned after the machine was changed.
    pub async fn restore_snapshot(&self, snapshot: &StateSnapshot) -> Result<RestoreReport> {
        let id = snapshot.id.as_str();
        for (path, label) in [
            (&snapshot.config_path, "config.json"),
            (&snapshot.system_state_path, "system-state.json"),
        ] {
            if !path.exists() {
                return Err(Error::state_sync(id, format!("{label} is missing"), None));
            }
        }

        let config: SystemConfig = io::read_json(&snapshot.config_path).map_err(|e| {
            Error::state_sync(id, "config.json is unreadable", Some(e.into()))
        })?;
        let system: SystemState = io::read_json(&snapshot.system_state_path).map_err(|e| {
            Error::state_sync(id, "system-state.json is unreadable", Some(e.into()))
        })?;

        let mut report = RestoreReport {
            snapshot_id: id.to_string(),
            ..RestoreReport::default()
        };

        report.record(
            format!("Set hostname to {}", system.hostname),
            self.live.set_hostname(&system.hostname).await,
        );
        report.record(
            format!("Set timezone to {}", system.timezone),
            self.live.set_timezone(&system.timezone).await,
        );

        if snapshot.services_path.exists() {
            match io::read_json::<Vec<ServiceState>>(&snapshot.services_path) {
                Ok(services) => self.restore_services(&services, &mut report).await,
                Err(e) => report
                    .warnings
                    .push(format!("Service states not restored: {e}")),
            }
        } else {
            report
                .warnings
                .push("No service states in snapshot; services left as they are".to_string());
        }

        if snapshot.packages_path.exists() {
            report.warnings.push(
                "Package list not applied; review packages.txt and reconcile packages manually"
                    .to_string(),
            );
        }

        self.store.sync_state(&config)?;

        tracing::info!(
            snapshot = %id,
            actions = report.actions.len(),
            warnings = report.warnings.len(),
            "Snapshot restored"
        );
        Ok(report)
    }

    async fn restore_services(&self, services: &[ServiceState], report: &mut RestoreReport) {
        for service in services {
            if service.active {
                report.record(
                    format!("Start service {}", service.name),
                    self.live.start_service(&service.name).await,
                );
            } else {
                report.record(
                    format!("Stop service {}", service.name),
                    self.live.stop_service(&service.name).await,
                );
            }
        }
    }
}
