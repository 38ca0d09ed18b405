//! Wiring of settings, state store and live system for a command

use std::path::Path;
use std::sync::Arc;

use horizon_state::{
    HorizonSettings, LiveSystem, RestoreManager, SnapshotManager, StateStore, SyncChecker,
    SystemCommandExecutor,
};

use crate::error::Result;

pub struct Context {
    pub settings: HorizonSettings,
    pub store: Arc<StateStore>,
    live: LiveSystem,
}

impl Context {
    pub fn load(settings_path: &Path) -> Result<Self> {
        let settings = HorizonSettings::load(settings_path)?;
        tracing::debug!(
            settings = %settings_path.display(),
            state_dir = %settings.state_dir.display(),
            "Loaded settings"
        );

        let store = Arc::new(StateStore::open(settings.layout()));
        let live = LiveSystem::new(
            Arc::new(SystemCommandExecutor::new()),
            settings.command_timeout(),
        );
        Ok(Self {
            settings,
            store,
            live,
        })
    }

    pub fn snapshots(&self) -> SnapshotManager {
        SnapshotManager::new(Arc::clone(&self.store), self.live.clone())
    }

    pub fn restorer(&self) -> RestoreManager {
        RestoreManager::new(Arc::clone(&self.store), self.live.clone())
    }

    pub fn checker(&self) -> SyncChecker {
        SyncChecker::new(self.live.clone())
    }
}

/// Run an async command body on a single-threaded runtime.
pub fn block_on<F: std::future::Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    Ok(runtime.block_on(future))
}
