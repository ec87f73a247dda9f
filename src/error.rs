//! Error types for the spotter serving engine

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for spotter operations
pub type Result<T> = std::result::Result<T, SpotterError>;

/// Main error type for the serving engine
#[derive(Error, Debug)]
pub enum SpotterError {
    /// Required configuration is absent or malformed. Fatal to the load
    /// sequence: fetch must not proceed against an unnamed artifact.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Remote artifact retrieval failed (transport, auth, or not-found).
    #[error("Artifact fetch failed: {0}")]
    Fetch(String),

    /// The local artifact file was absent when load ran. Distinct from
    /// transport errors: this means load was invoked before fetch completed.
    #[error("Model artifact not found at {}; was it fetched at startup?", .path.display())]
    ArtifactMissing { path: PathBuf },

    /// The artifact could not be deserialized or its shape does not match
    /// the compiled classifier architecture.
    #[error("Model load failed: {0}")]
    Load(String),

    /// Malformed client request. Local to one request.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unexpected failure during decode, preprocessing, or prediction.
    /// Local to one request.
    #[error("Inference error: {0}")]
    Inference(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
