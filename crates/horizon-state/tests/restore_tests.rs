//! Restoring snapshots onto a fake machine

use std::fs;
use std::sync::Arc;

use horizon_state::store::keys;
use horizon_state::{Error, RestoreManager, SnapshotManager, StateSnapshot};
use horizon_test_utils::{Failure, FakeMachine, TestStateDir, sample_config, sample_machine};
use pretty_assertions::assert_eq;

struct Fixture {
    dir: TestStateDir,
    machine: Arc<FakeMachine>,
    snapshots: SnapshotManager,
    restore: RestoreManager,
}

impl Fixture {
    fn new() -> Self {
        let dir = TestStateDir::new();
        let machine = Arc::new(sample_machine("edge-01"));
        let snapshots = SnapshotManager::new(Arc::clone(&dir.store), machine.live());
        let restore = RestoreManager::new(Arc::clone(&dir.store), machine.live());
        dir.store.sync_state(&sample_config("edge-01")).unwrap();
        Self {
            dir,
            machine,
            snapshots,
            restore,
        }
    }

    async fn snapshot(&self) -> StateSnapshot {
        self.snapshots.create_snapshot().await.unwrap().snapshot
    }
}

#[tokio::test]
async fn restore_reapplies_identity_and_services() {
    let fx = Fixture::new();
    let snapshot = fx.snapshot().await;

    fx.machine.set_hostname("drifted");
    fx.machine.set_timezone("Asia/Tokyo");
    fx.machine.set_service_active("nginx", false);
    fx.machine.set_service_active("cups", true);

    let report = fx.restore.restore_snapshot(&snapshot).await.unwrap();

    assert_eq!(fx.machine.hostname(), "edge-01");
    assert_eq!(fx.machine.timezone(), "UTC");
    assert_eq!(fx.machine.service("nginx"), Some((true, true)));
    assert_eq!(fx.machine.service("cups"), Some((false, false)));
    assert!(report.actions.contains(&"Set hostname to edge-01".to_string()));
    assert!(report.actions.contains(&"Start service nginx".to_string()));
    assert!(report.actions.contains(&"Stop service cups".to_string()));
}

#[tokio::test]
async fn packages_are_never_touched() {
    let fx = Fixture::new();
    let snapshot = fx.snapshot().await;
    fx.machine.remove_package("vim");

    let report = fx.restore.restore_snapshot(&snapshot).await.unwrap();

    assert!(fx.machine.commands().iter().all(|c| c.program != "pacman" || c.args == ["-Qq"]));
    assert!(report.warnings.iter().any(|w| w.contains("Package list not applied")));
}

#[tokio::test]
async fn restore_records_the_snapshot_config_as_last_synced() {
    let fx = Fixture::new();
    let snapshot = fx.snapshot().await;

    fx.dir.store.sync_state(&sample_config("elsewhere")).unwrap();
    fx.restore.restore_snapshot(&snapshot).await.unwrap();

    assert_eq!(fx.dir.store.current_state()[keys::HOSTNAME], "edge-01");
    assert_eq!(
        fx.dir.reopen().last_synced_config().as_deref(),
        Some(&sample_config("edge-01"))
    );
}

#[tokio::test]
async fn missing_config_fails_fast_without_touching_the_machine() {
    let fx = Fixture::new();
    let snapshot = fx.snapshot().await;
    fs::remove_file(&snapshot.config_path).unwrap();

    let err = fx.restore.restore_snapshot(&snapshot).await.unwrap_err();

    match err {
        Error::StateSync { snapshot_id, message, .. } => {
            assert_eq!(snapshot_id, snapshot.id);
            assert!(message.contains("config.json"));
        }
        other => panic!("expected state sync error, got {other:?}"),
    }
    assert!(fx.machine.mutations().is_empty());
}

#[tokio::test]
async fn missing_system_state_fails_fast() {
    let fx = Fixture::new();
    let snapshot = fx.snapshot().await;
    fs::remove_file(&snapshot.system_state_path).unwrap();

    let err = fx.restore.restore_snapshot(&snapshot).await.unwrap_err();
    assert!(matches!(err, Error::StateSync { ref message, .. } if message.contains("system-state.json")));
    assert!(fx.machine.mutations().is_empty());
}

#[tokio::test]
async fn corrupt_config_is_a_state_sync_error_with_cause() {
    let fx = Fixture::new();
    let snapshot = fx.snapshot().await;
    fs::write(&snapshot.config_path, "{ broken").unwrap();

    match fx.restore.restore_snapshot(&snapshot).await {
        Err(Error::StateSync { source, .. }) => assert!(source.is_some()),
        other => panic!("expected state sync error, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_services_file_skips_service_restore() {
    let fx = Fixture::new();
    let snapshot = fx.snapshot().await;
    fs::remove_file(&snapshot.services_path).unwrap();
    fx.machine.set_service_active("nginx", false);

    let report = fx.restore.restore_snapshot(&snapshot).await.unwrap();

    assert_eq!(fx.machine.service("nginx"), Some((true, false)));
    assert_eq!(
        fx.machine.mutations(),
        vec!["hostnamectl set-hostname edge-01", "timedatectl set-timezone UTC"]
    );
    assert!(report.warnings.iter().any(|w| w.contains("No service states")));
}

#[tokio::test]
async fn failed_step_is_a_warning_and_restore_continues() {
    let fx = Fixture::new();
    let snapshot = fx.snapshot().await;
    fx.machine.set_service_active("nginx", false);
    fx.machine.break_program("hostnamectl", Failure::Exit);

    let report = fx.restore.restore_snapshot(&snapshot).await.unwrap();

    assert!(report.warnings.iter().any(|w| w.starts_with("Set hostname to edge-01 failed")));
    assert_eq!(fx.machine.service("nginx"), Some((true, true)));
    assert_eq!(fx.machine.timezone(), "UTC");
}
