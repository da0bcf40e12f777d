//! Error types for bundle operations.

use thiserror::Error;

/// Errors that can occur while writing or reading a support bundle.
#[derive(Error, Debug)]
pub enum BundleError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP archive error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("checksum mismatch for '{path}': expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    /// Missing required file in bundle
    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("unsupported bundle version: {version} (supported: {supported})")]
    UnsupportedVersion { version: String, supported: String },

    #[error("corrupted manifest: {0}")]
    CorruptedManifest(String),

    /// Entry listed in the manifest or requested by name is absent
    #[error("file not found in bundle: {0}")]
    FileNotFound(String),

    /// Two entries share one archive name
    #[error("duplicate entry in bundle: {0}")]
    DuplicateFile(String),

    /// Entry name would collide with the manifest or escape the archive root
    #[error("invalid entry name: {0}")]
    InvalidName(String),

    #[error("bundle has no content to write")]
    EmptyBundle,
}

/// Result type alias for bundle operations.
pub type Result<T> = std::result::Result<T, BundleError>;
