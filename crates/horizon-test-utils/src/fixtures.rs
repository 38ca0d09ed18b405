//! Sample images, configurations and state directories.

use std::path::Path;
use std::sync::Arc;

use horizon_fs::StateLayout;
use horizon_image::{ContainerImage, FlatpakImage, LayerImage, OstreeImage, SystemImage};
use horizon_state::{PackageAction, StateStore, SystemConfig};
use tempfile::TempDir;

use crate::machine::FakeMachine;

/// A well-formed digest made of one repeated hex character.
pub fn digest(c: char) -> String {
    format!("sha256:{}", c.to_string().repeat(64))
}

/// A valid image with two containers, one Flatpak and two layers.
pub fn sample_image() -> SystemImage {
    SystemImage::new(
        "1.4.0",
        OstreeImage::new("horizonos/stable/x86_64", "c1", digest('0')),
    )
    .with_container(ContainerImage::new("web", "docker.io/library/nginx", digest('a')))
    .with_container(ContainerImage::new("db", "docker.io/library/postgres", digest('b')))
    .with_flatpak(FlatpakImage::new("org.mozilla.firefox", "f1"))
    .with_layer(LayerImage::new(
        "base-tools",
        ContainerImage::new("base-tools", "ghcr.io/horizonos/base-tools", digest('c')),
    ))
    .with_layer(
        LayerImage::new(
            "dev",
            ContainerImage::new("dev", "ghcr.io/horizonos/dev", digest('d')),
        )
        .depends_on("base-tools"),
    )
}

/// A machine that is in sync with [`sample_config`] for the same hostname.
pub fn sample_machine(hostname: &str) -> FakeMachine {
    FakeMachine::new(hostname)
        .with_service("nginx", true, true)
        .with_service("cups", false, false)
        .with_service("sshd", true, true)
        .with_packages(&["base", "git", "linux", "vim"])
}

/// Configuration for a machine named `hostname`.
pub fn sample_config(hostname: &str) -> SystemConfig {
    SystemConfig::new(hostname)
        .with_service("nginx", true)
        .with_service("cups", false)
        .with_package("git", PackageAction::Install)
        .with_package("vim", PackageAction::Install)
        .with_package("nano", PackageAction::Remove)
}

/// A temporary state directory with an opened [`StateStore`].
pub struct TestStateDir {
    temp_dir: TempDir,
    pub store: Arc<StateStore>,
}

impl Default for TestStateDir {
    fn default() -> Self {
        Self::new()
    }
}

impl TestStateDir {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(StateStore::open(StateLayout::new(temp_dir.path())));
        Self { temp_dir, store }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn layout(&self) -> StateLayout {
        StateLayout::new(self.root())
    }

    /// Re-open the store from disk, as a new process would.
    pub fn reopen(&self) -> Arc<StateStore> {
        Arc::new(StateStore::open(self.layout()))
    }
}
