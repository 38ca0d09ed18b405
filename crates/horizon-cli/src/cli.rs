//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use horizon_state::DEFAULT_SETTINGS_PATH;

/// HorizonOS reconciler - keep the live machine in step with its configuration
#[derive(Parser, Debug)]
#[command(name = "horizon")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Settings file
    #[arg(long, global = true, env = "HORIZON_SETTINGS", default_value = DEFAULT_SETTINGS_PATH)]
    pub settings: PathBuf,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Check the live machine for drift from a configuration
    ///
    /// Exits non-zero when any drift is found.
    Check {
        /// Compiled configuration (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Inspect or update the recorded state
    State {
        #[command(subcommand)]
        action: StateAction,
    },

    /// Capture, list, restore and prune snapshots
    Snapshot {
        #[command(subcommand)]
        action: SnapshotAction,
    },

    /// Validate, fingerprint and compare system images
    Image {
        #[command(subcommand)]
        action: ImageAction,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum StateAction {
    /// Show the state recorded by the last sync
    Show {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Record a configuration as the last synced one
    Record {
        /// Compiled configuration (JSON)
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum SnapshotAction {
    /// Capture the live machine into a new snapshot
    Create,

    /// List snapshots, newest first
    List {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Re-apply a snapshot to the live machine
    Restore {
        /// Snapshot id as shown by `snapshot list`
        id: String,
    },

    /// Delete old snapshots
    Cleanup {
        /// Number of snapshots to keep (defaults to the configured retention)
        #[arg(long)]
        keep: Option<usize>,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ImageAction {
    /// Report every integrity violation in an image
    Validate {
        /// System image (JSON)
        file: PathBuf,
    },

    /// Print the content digest of an image
    Digest {
        /// System image (JSON)
        file: PathBuf,
    },

    /// Show what changed between two images
    Diff {
        old: PathBuf,
        new: PathBuf,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Print the order in which the image's layers deploy
    Order {
        /// System image (JSON)
        file: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_check() {
        let cli = Cli::parse_from(["horizon", "check", "--config", "system.json", "--json"]);
        assert_eq!(
            cli.command,
            Some(Commands::Check {
                config: PathBuf::from("system.json"),
                json: true
            })
        );
        assert_eq!(cli.settings, PathBuf::from(DEFAULT_SETTINGS_PATH));
    }

    #[test]
    fn parses_snapshot_cleanup_with_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "horizon", "snapshot", "cleanup", "--keep", "3", "-v", "--settings", "/tmp/h.toml",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.settings, PathBuf::from("/tmp/h.toml"));
        assert_eq!(
            cli.command,
            Some(Commands::Snapshot {
                action: SnapshotAction::Cleanup { keep: Some(3) }
            })
        );
    }

    #[test]
    fn parses_image_diff() {
        let cli = Cli::parse_from(["horizon", "image", "diff", "a.json", "b.json"]);
        assert_eq!(
            cli.command,
            Some(Commands::Image {
                action: ImageAction::Diff {
                    old: PathBuf::from("a.json"),
                    new: PathBuf::from("b.json"),
                    json: false
                }
            })
        );
    }
}
