//! Content-addressing digest of a [`SystemImage`]
//!
//! The digest is computed over a canonical JSON form:
//! - containers sorted by `name`, Flatpaks by `id`, layers by `name`
//! - metadata as an ordered map
//! - the image `timestamp` and `signature` left out; neither is deployed
//!   state and a signature covers the digest itself
//!
//! Package and parent-layer lists inside a container keep their order
//! because that order is meaningful.

use std::collections::BTreeMap;

use horizon_fs::compute_content_checksum;
use serde::Serialize;

use crate::Result;
use crate::model::{ContainerImage, FlatpakImage, LayerImage, OstreeImage, SystemImage};

/// Canonical form of the deployable fields of an image.
#[derive(Serialize)]
struct CanonicalImage<'a> {
    version: &'a str,
    base: &'a OstreeImage,
    containers: Vec<&'a ContainerImage>,
    flatpaks: Vec<&'a FlatpakImage>,
    layers: Vec<&'a LayerImage>,
    metadata: &'a BTreeMap<String, String>,
}

impl<'a> From<&'a SystemImage> for CanonicalImage<'a> {
    fn from(image: &'a SystemImage) -> Self {
        let mut containers: Vec<_> = image.containers.iter().collect();
        containers.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.digest.cmp(&b.digest)));

        let mut flatpaks: Vec<_> = image.flatpaks.iter().collect();
        flatpaks.sort_by(|a, b| a.id.cmp(&b.id).then_with(|| a.commit.cmp(&b.commit)));

        let mut layers: Vec<_> = image.layers.iter().collect();
        layers.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.checksum.cmp(&b.checksum)));

        Self {
            version: &image.version,
            base: &image.base,
            containers,
            flatpaks,
            layers,
            metadata: &image.metadata,
        }
    }
}

/// Compute the `sha256:` digest of an image.
///
/// Deterministic: equal deployable content always yields the same digest,
/// regardless of collection order or when the image was built.
pub fn checksum(image: &SystemImage) -> Result<String> {
    let canonical = serde_json::to_vec(&CanonicalImage::from(image))?;
    Ok(compute_content_checksum(canonical))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PackageInfo;
    use chrono::TimeDelta;
    use horizon_fs::is_sha256_digest;

    fn digest(c: char) -> String {
        format!("sha256:{}", c.to_string().repeat(64))
    }

    fn image() -> SystemImage {
        SystemImage::new("1.0.0", OstreeImage::new("horizonos/stable", "c1", digest('0')))
            .with_container(ContainerImage::new("web", "nginx", digest('a')))
            .with_container(ContainerImage::new("cache", "redis", digest('b')))
            .with_flatpak(FlatpakImage::new("org.a.App", "f1"))
            .with_flatpak(FlatpakImage::new("org.b.App", "f2"))
            .with_layer(LayerImage::new("x", ContainerImage::new("x", "x", digest('c'))))
            .with_layer(LayerImage::new("y", ContainerImage::new("y", "y", digest('d'))))
            .with_metadata("channel", "stable")
    }

    #[test]
    fn checksum_is_well_formed() {
        assert!(is_sha256_digest(&checksum(&image()).unwrap()));
    }

    #[test]
    fn checksum_is_deterministic() {
        assert_eq!(checksum(&image()).unwrap(), checksum(&image().clone()).unwrap());
    }

    #[test]
    fn checksum_ignores_collection_order() {
        let original = image();
        let mut shuffled = original.clone();
        shuffled.containers.reverse();
        shuffled.flatpaks.reverse();
        shuffled.layers.reverse();
        assert_eq!(checksum(&original).unwrap(), checksum(&shuffled).unwrap());
    }

    #[test]
    fn checksum_ignores_timestamp_and_signature() {
        let original = image();
        let mut rebuilt = original.clone();
        rebuilt.timestamp += TimeDelta::days(3);
        rebuilt.signature = Some("sig".into());
        assert_eq!(checksum(&original).unwrap(), checksum(&rebuilt).unwrap());
    }

    #[test]
    fn checksum_is_stable_across_reserialization() {
        let original = image();
        let json = serde_json::to_string_pretty(&original).unwrap();
        let reparsed: SystemImage = serde_json::from_str(&json).unwrap();
        assert_eq!(checksum(&original).unwrap(), checksum(&reparsed).unwrap());
    }

    #[test]
    fn checksum_tracks_every_deployed_field() {
        let base = checksum(&image()).unwrap();
        let mutations: Vec<Box<dyn Fn(&mut SystemImage)>> = vec![
            Box::new(|i: &mut SystemImage| i.base.commit = "c2".into()),
            Box::new(|i: &mut SystemImage| i.containers[0].digest = digest('e')),
            Box::new(|i: &mut SystemImage| i.flatpaks[1].commit = "f3".into()),
            Box::new(|i: &mut SystemImage| i.layers[0].image.digest = digest('f')),
            Box::new(|i: &mut SystemImage| i.layers[1].checksum = digest('1')),
            Box::new(|i: &mut SystemImage| {
                i.metadata.insert("channel".into(), "beta".into());
            }),
            Box::new(|i: &mut SystemImage| i.version = "1.0.1".into()),
            Box::new(|i: &mut SystemImage| {
                i.containers[1].packages.push(PackageInfo {
                    name: "redis".into(),
                    version: "7.2".into(),
                    architecture: "x86_64".into(),
                    size: 1,
                    checksum: String::new(),
                    dependencies: vec![],
                    origin: "fedora".into(),
                })
            }),
        ];

        for (n, mutate) in mutations.iter().enumerate() {
            let mut changed = image();
            mutate(&mut changed);
            assert_ne!(checksum(&changed).unwrap(), base, "mutation {n} did not change the digest");
        }
    }
}
