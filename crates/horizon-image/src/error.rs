//! Error types for horizon-image

/// Result type for horizon-image operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in horizon-image operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Raised only when validation runs in strict mode
    #[error("Image validation failed with {} violation(s): {}", violations.len(), violations.join("; "))]
    Validation { violations: Vec<String> },

    /// Layer dependencies form at least one cycle
    #[error("Layer dependency cycle detected among: {}", layers.join(", "))]
    DependencyCycle { layers: Vec<String> },

    /// A layer depends on a layer the image does not contain
    #[error("Layer '{layer}' depends on unknown layer '{dependency}'")]
    UnknownDependency { layer: String, dependency: String },

    /// Two layers share a name
    #[error("Duplicate layer name '{name}'")]
    DuplicateLayer { name: String },

    /// The canonical form could not be encoded
    #[error("Failed to encode image for hashing: {0}")]
    Encode(#[from] serde_json::Error),

    /// Filesystem error from horizon-fs
    #[error(transparent)]
    Fs(#[from] horizon_fs::Error),
}
