//! Structured delta between two system images

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::SystemImage;

/// Kind of a keyed change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeType {
    Added,
    Removed,
    Updated,
}

impl ChangeType {
    fn marker(self) -> char {
        match self {
            Self::Added => '+',
            Self::Removed => '-',
            Self::Updated => '~',
        }
    }
}

/// A change to one container (keyed by name) or Flatpak (keyed by id).
///
/// Values are the container digest or Flatpak commit on each side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Change {
    pub key: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    #[serde(rename = "type")]
    pub change_type: ChangeType,
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = self.change_type.marker();
        match (&self.old_value, &self.new_value) {
            (Some(old), Some(new)) => write!(f, "{marker} {} {old} -> {new}", self.key),
            (None, Some(value)) | (Some(value), None) => {
                write!(f, "{marker} {} {value}", self.key)
            }
            (None, None) => write!(f, "{marker} {}", self.key),
        }
    }
}

/// Result of [`compare`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemImageDiff {
    pub base_changed: bool,
    pub container_changes: Vec<Change>,
    pub flatpak_changes: Vec<Change>,
}

impl SystemImageDiff {
    pub fn has_changes(&self) -> bool {
        self.base_changed || !self.container_changes.is_empty() || !self.flatpak_changes.is_empty()
    }
}

impl fmt::Display for SystemImageDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.has_changes() {
            return writeln!(f, "no changes");
        }
        if self.base_changed {
            writeln!(f, "base: commit changed")?;
        }
        for (title, changes) in [
            ("containers", &self.container_changes),
            ("flatpaks", &self.flatpak_changes),
        ] {
            if changes.is_empty() {
                continue;
            }
            writeln!(f, "{title}:")?;
            for change in changes {
                writeln!(f, "  {change}")?;
            }
        }
        Ok(())
    }
}

/// Compute the delta from `old` to `new`.
///
/// Pure and linear in the number of containers and Flatpaks. Keys only in
/// `new` are `Added`, keys only in `old` are `Removed`, keys in both with a
/// different digest (container) or commit (Flatpak) are `Updated`; keys
/// that did not change produce no entry. Changes are ordered by key.
pub fn compare(old: &SystemImage, new: &SystemImage) -> SystemImageDiff {
    let container_changes = keyed_changes(
        old.containers.iter().map(|c| (c.name.as_str(), c.digest.as_str())),
        new.containers.iter().map(|c| (c.name.as_str(), c.digest.as_str())),
    );
    let flatpak_changes = keyed_changes(
        old.flatpaks.iter().map(|f| (f.id.as_str(), f.commit.as_str())),
        new.flatpaks.iter().map(|f| (f.id.as_str(), f.commit.as_str())),
    );

    SystemImageDiff {
        base_changed: old.base.commit != new.base.commit,
        container_changes,
        flatpak_changes,
    }
}

fn keyed_changes<'a>(
    old: impl Iterator<Item = (&'a str, &'a str)>,
    new: impl Iterator<Item = (&'a str, &'a str)>,
) -> Vec<Change> {
    let old: BTreeMap<&str, &str> = old.collect();
    let new: BTreeMap<&str, &str> = new.collect();

    let mut changes: BTreeMap<&str, Change> = BTreeMap::new();

    for (key, new_value) in &new {
        match old.get(key) {
            None => {
                changes.insert(
                    *key,
                    Change {
                        key: key.to_string(),
                        old_value: None,
                        new_value: Some(new_value.to_string()),
                        change_type: ChangeType::Added,
                    },
                );
            }
            Some(old_value) if old_value != new_value => {
                changes.insert(
                    *key,
                    Change {
                        key: key.to_string(),
                        old_value: Some(old_value.to_string()),
                        new_value: Some(new_value.to_string()),
                        change_type: ChangeType::Updated,
                    },
                );
            }
            Some(_) => {}
        }
    }

    for (key, old_value) in &old {
        if !new.contains_key(key) {
            changes.insert(
                *key,
                Change {
                    key: key.to_string(),
                    old_value: Some(old_value.to_string()),
                    new_value: None,
                    change_type: ChangeType::Removed,
                },
            );
        }
    }

    changes.into_values().collect()
}
