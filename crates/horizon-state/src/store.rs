//! Persisted summary of the last synced configuration
//!
//! The store is a flat string map in `current-state.json`, written after
//! every successful sync. The configuration itself is kept alongside in
//! `last-config.json` so a snapshot taken after a restart still records it.
//!
//! Writers are serialized by an in-process mutex plus an advisory lock on
//! `.current-state.lock`; files are replaced atomically. Readers get an
//! `Arc` of an immutable map and never see a partially applied sync.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::Utc;
use horizon_fs::{FileLock, StateFile, StateLayout, io};

use crate::Result;
use crate::config::SystemConfig;

/// Immutable view of the store contents
pub type StateMap = BTreeMap<String, String>;

/// Keys written by [`StateStore::sync_state`]
pub mod keys {
    pub const LAST_SYNC: &str = "last_sync";
    pub const CONFIG_HASH: &str = "config_hash";
    pub const HOSTNAME: &str = "hostname";
    pub const TIMEZONE: &str = "timezone";
    pub const LOCALE: &str = "locale";
    pub const SERVICES: &str = "services";
    pub const PACKAGES: &str = "packages";
    pub const USERS: &str = "users";
}

pub struct StateStore {
    layout: StateLayout,
    state: RwLock<Arc<StateMap>>,
    last_config: RwLock<Option<Arc<SystemConfig>>>,
    writer: Mutex<()>,
}

impl StateStore {
    /// Open the store rooted at `layout`.
    ///
    /// Missing or unreadable state files are logged and the store starts
    /// empty; a damaged store never blocks a fresh sync.
    pub fn open(layout: StateLayout) -> Self {
        let state = load_or_default::<StateMap>(&layout, StateFile::CurrentState);
        let last_config = load_or_default::<Option<SystemConfig>>(&layout, StateFile::LastConfig);

        tracing::debug!(
            root = %layout.root().display(),
            keys = state.len(),
            has_config = last_config.is_some(),
            "Opened state store"
        );

        Self {
            layout,
            state: RwLock::new(Arc::new(state)),
            last_config: RwLock::new(last_config.map(Arc::new)),
            writer: Mutex::new(()),
        }
    }

    pub fn layout(&self) -> &StateLayout {
        &self.layout
    }

    /// Snapshot of the current state. Later syncs do not affect it.
    pub fn current_state(&self) -> Arc<StateMap> {
        Arc::clone(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// The configuration recorded by the last successful sync, if any.
    pub fn last_synced_config(&self) -> Option<Arc<SystemConfig>> {
        self.last_config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the stored state with a summary of `config` and persist it.
    ///
    /// The in-memory state only changes once both files are on disk, so a
    /// failed write leaves the previous state visible.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized or the
    /// state files cannot be locked or written.
    pub fn sync_state(&self, config: &SystemConfig) -> Result<Arc<StateMap>> {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let _lock = FileLock::acquire(&self.layout.file(StateFile::StoreLock))?;

        let state = summarize(config)?;
        io::write_json(&self.layout.file(StateFile::LastConfig), config)?;
        io::write_json(&self.layout.file(StateFile::CurrentState), &state)?;

        let state = Arc::new(state);
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&state);
        *self
            .last_config
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(config.clone()));

        tracing::info!(
            hostname = %config.system.hostname,
            services = config.services.len(),
            packages = config.packages.len(),
            "State synced"
        );
        Ok(state)
    }
}

fn summarize(config: &SystemConfig) -> Result<StateMap> {
    let mut state = StateMap::new();
    state.insert(keys::LAST_SYNC.into(), Utc::now().to_rfc3339());
    state.insert(keys::CONFIG_HASH.into(), config.checksum()?);
    state.insert(keys::HOSTNAME.into(), config.system.hostname.clone());
    state.insert(keys::TIMEZONE.into(), config.system.timezone.clone());
    state.insert(keys::LOCALE.into(), config.system.locale.clone());
    state.insert(keys::SERVICES.into(), serde_json::to_string(&config.services)?);
    state.insert(keys::PACKAGES.into(), serde_json::to_string(&config.packages)?);
    state.insert(keys::USERS.into(), serde_json::to_string(&config.users)?);
    Ok(state)
}

fn load_or_default<T>(layout: &StateLayout, file: StateFile) -> T
where
    T: serde::de::DeserializeOwned + Default,
{
    let path = layout.file(file);
    match io::read_json(&path) {
        Ok(value) => value,
        Err(e) if e.is_not_found() => T::default(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable state file");
            T::default()
        }
    }
}
