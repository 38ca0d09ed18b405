//! Snapshot, restore and drift check working together on one machine

use std::sync::Arc;

use horizon_state::{
    RestoreManager, SnapshotManager, StateSnapshot, SyncChecker, SyncIssue, SyncStatus,
};
use horizon_test_utils::{FakeMachine, TestStateDir, sample_config, sample_machine};
use pretty_assertions::assert_eq;

struct Node {
    dir: TestStateDir,
    machine: Arc<FakeMachine>,
}

impl Node {
    fn new(hostname: &str) -> Self {
        Self {
            dir: TestStateDir::new(),
            machine: Arc::new(sample_machine(hostname)),
        }
    }

    fn snapshots(&self) -> SnapshotManager {
        SnapshotManager::new(Arc::clone(&self.dir.store), self.machine.live())
    }

    fn restorer(&self) -> RestoreManager {
        RestoreManager::new(Arc::clone(&self.dir.store), self.machine.live())
    }

    fn checker(&self) -> SyncChecker {
        SyncChecker::new(self.machine.live())
    }

    async fn snapshot(&self) -> StateSnapshot {
        self.snapshots().create_snapshot().await.unwrap().snapshot
    }
}

#[tokio::test]
async fn snapshot_then_restore_on_unchanged_machine_stays_in_sync() {
    let node = Node::new("edge-01");
    let config = sample_config("edge-01");
    node.dir.store.sync_state(&config).unwrap();

    let snapshot = node.snapshot().await;
    let report = node.restorer().restore_snapshot(&snapshot).await.unwrap();

    assert!(report.warnings.iter().all(|w| w.contains("Package list")));
    assert_eq!(node.checker().check_sync(&config).await, SyncStatus::InSync);
}

#[tokio::test]
async fn restore_repairs_identity_and_service_drift() {
    let node = Node::new("edge-01");
    let config = sample_config("edge-01");
    node.dir.store.sync_state(&config).unwrap();
    let snapshot = node.snapshot().await;

    node.machine.set_hostname("rogue");
    node.machine.set_service_active("nginx", false);

    let drift = node.checker().check_sync(&config).await;
    assert_eq!(
        drift.issues(),
        &[SyncIssue::new("system", "hostname", "edge-01", "rogue")]
    );

    node.restorer().restore_snapshot(&snapshot).await.unwrap();

    assert!(node.checker().check_sync(&config).await.is_in_sync());
    assert_eq!(node.machine.service("nginx"), Some((true, true)));
}

#[tokio::test]
async fn snapshot_after_restart_still_records_the_config() {
    let node = Node::new("edge-01");
    node.dir.store.sync_state(&sample_config("edge-01")).unwrap();

    let store = node.dir.reopen();
    let snapshots = SnapshotManager::new(store, node.machine.live());
    let report = snapshots.create_snapshot().await.unwrap();

    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    let config: horizon_state::SystemConfig =
        horizon_fs::io::read_json(&report.snapshot.config_path).unwrap();
    assert_eq!(config, sample_config("edge-01"));
}

#[tokio::test]
async fn retention_keeps_the_snapshot_just_taken() {
    let node = Node::new("edge-01");
    let manager = node.snapshots();

    let mut latest = None;
    for _ in 0..4 {
        latest = Some(manager.create_snapshot().await.unwrap().snapshot);
    }
    let latest = latest.unwrap();

    let report = manager.cleanup_snapshots(1).unwrap();
    assert_eq!(report.removed.len(), 3);

    let remaining = manager.list_snapshots().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, latest.id);
    assert_eq!(manager.load_snapshot(&latest.id).unwrap(), latest);
}
