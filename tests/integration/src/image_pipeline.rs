//! Image validation, digest, diff and ordering on a configuration's image

use horizon_image::{
    ChangeType, ContainerImage, SystemImage, ValidationMode, compare, deployment_order, validate,
};
use horizon_state::SystemConfig;
use horizon_test_utils::{digest, sample_config, sample_image};
use pretty_assertions::assert_eq;

fn config_with(image: SystemImage) -> SystemConfig {
    SystemConfig {
        image: Some(image),
        ..sample_config("edge-01")
    }
}

#[test]
fn image_survives_the_configuration_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("system.json");
    let config = config_with(sample_image());

    config.save(&path).unwrap();
    let loaded = SystemConfig::load(&path).unwrap();
    let image = loaded.image.as_ref().unwrap();

    assert!(validate(image).is_empty());
    assert_eq!(image.checksum().unwrap(), sample_image().checksum().unwrap());
}

#[test]
fn upgrade_is_detected_by_digest_and_described_by_diff() {
    let old = sample_image();
    let mut new = sample_image();
    new.version = "1.5.0".into();
    new.containers[1].digest = digest('f');
    new.containers.push(ContainerImage::new("cache", "docker.io/library/redis", digest('9')));

    assert_ne!(old.checksum().unwrap(), new.checksum().unwrap());

    let diff = compare(&old, &new);
    assert!(diff.has_changes());
    assert!(!diff.base_changed);
    let kinds: Vec<(&str, ChangeType)> = diff
        .container_changes
        .iter()
        .map(|c| (c.key.as_str(), c.change_type))
        .collect();
    assert_eq!(kinds, vec![("cache", ChangeType::Added), ("db", ChangeType::Updated)]);
}

#[test]
fn strict_mode_blocks_what_warn_mode_lets_through() {
    let mut image = sample_image();
    image.layers[1].dependencies.push("missing".into());

    assert_eq!(ValidationMode::Warn.enforce(&image).unwrap().len(), 1);
    assert!(ValidationMode::Strict.enforce(&image).is_err());
    assert!(deployment_order(&image).is_err());
}

#[test]
fn layers_deploy_after_their_dependencies() {
    let order: Vec<String> = deployment_order(&sample_image())
        .unwrap()
        .into_iter()
        .map(|l| l.name.clone())
        .collect();
    assert_eq!(order, vec!["base-tools", "dev"]);
}
