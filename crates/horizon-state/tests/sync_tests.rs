//! Drift checks against a fake machine

use std::sync::Arc;

use horizon_state::{PackageAction, SyncChecker, SyncIssue, SyncStatus, SystemConfig};
use horizon_test_utils::{Failure, FakeMachine, sample_config, sample_machine};
use pretty_assertions::assert_eq;

fn checker(machine: &Arc<FakeMachine>) -> SyncChecker {
    SyncChecker::new(machine.live())
}

#[tokio::test]
async fn matching_machine_is_in_sync() {
    let machine = Arc::new(sample_machine("edge-01"));
    let status = checker(&machine).check_sync(&sample_config("edge-01")).await;
    assert_eq!(status, SyncStatus::InSync);
}

#[tokio::test]
async fn disabled_service_is_reported() {
    let machine = Arc::new(FakeMachine::new("edge-01").with_service("nginx", false, false));
    let config = SystemConfig::new("edge-01").with_service("nginx", true);

    let status = checker(&machine).check_sync(&config).await;

    assert_eq!(
        status,
        SyncStatus::OutOfSync(vec![SyncIssue::new("service", "nginx", "true", "false")])
    );
}

#[tokio::test]
async fn every_drift_is_reported_in_one_pass() {
    let machine = Arc::new(sample_machine("laptop"));
    machine.set_service("cups", true, true);
    machine.remove_package("git");
    let config = sample_config("edge-01")
        .with_service("bluetooth", true)
        .with_package("htop", PackageAction::Install);

    let status = checker(&machine).check_sync(&config).await;

    assert_eq!(
        status.issues(),
        &[
            SyncIssue::new("system", "hostname", "edge-01", "laptop"),
            SyncIssue::new("service", "cups", "false", "true"),
            SyncIssue::new("service", "bluetooth", "true", "false"),
            SyncIssue::new("package", "git", "installed", "missing"),
            SyncIssue::new("package", "htop", "installed", "missing"),
        ]
    );
}

#[tokio::test]
async fn removed_packages_are_not_checked() {
    let machine = Arc::new(sample_machine("edge-01"));
    let config = SystemConfig::new("edge-01").with_package("git", PackageAction::Remove);
    assert!(checker(&machine).check_sync(&config).await.is_in_sync());
}

#[tokio::test]
async fn uninspectable_items_are_reported_unavailable() {
    let machine = Arc::new(sample_machine("edge-01"));
    machine.break_program("pacman", Failure::Timeout);
    machine.break_program("hostnamectl", Failure::Spawn);

    let status = checker(&machine).check_sync(&sample_config("edge-01")).await;

    assert_eq!(
        status.issues(),
        &[
            SyncIssue::new("system", "hostname", "edge-01", "unavailable"),
            SyncIssue::new("package", "git", "installed", "unavailable"),
            SyncIssue::new("package", "vim", "installed", "unavailable"),
        ]
    );
}

#[tokio::test]
async fn checking_never_changes_the_machine() {
    let machine = Arc::new(sample_machine("laptop"));
    checker(&machine).check_sync(&sample_config("edge-01")).await;

    assert!(!machine.commands().is_empty());
    assert!(machine.mutations().is_empty());
    assert_eq!(machine.hostname(), "laptop");
}
