//! SHA-256 checksum utilities
//!
//! Provides a single canonical digest format (`sha256:<hex>`) used for
//! image content addressing, configuration hashes and digest validation.

use regex::Regex;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::LazyLock;

/// Prefix for all checksums produced by this module
pub const PREFIX: &str = "sha256:";

static SHA256_DIGEST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^sha256:[0-9a-f]{64}$").expect("digest pattern is a valid regex")
});

/// Compute the SHA-256 checksum of raw content.
///
/// Returns a string in the canonical format `"sha256:<hex>"`.
pub fn compute_content_checksum(content: impl AsRef<[u8]>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_ref());
    format!("{}{:x}", PREFIX, hasher.finalize())
}

/// Compute the SHA-256 checksum of a file's contents.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn compute_file_checksum(path: &Path) -> std::io::Result<String> {
    let content = std::fs::read(path)?;
    Ok(compute_content_checksum(content))
}

/// Whether `value` is a well-formed digest: `sha256:` followed by exactly
/// 64 lowercase hex characters.
pub fn is_sha256_digest(value: &str) -> bool {
    SHA256_DIGEST.is_match(value)
}
