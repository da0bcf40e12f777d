//! Error types for collection passes.

use thiserror::Error;

/// Errors that can occur while configuring or running a collection pass.
#[derive(Error, Debug)]
pub enum CollectError {
    /// A glob pattern could not be compiled.
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A configuration value is out of range.
    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    /// I/O error outside of per-file reads (those are skipped, not raised).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Options file could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The sink failed while consuming an entry. The pass was aborted.
    #[error("sink failed on '{name}': {source}")]
    Sink {
        name: String,
        #[source]
        source: SinkError,
    },
}

impl CollectError {
    /// True for errors raised while building a `CollectionSpec`.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            CollectError::InvalidPattern { .. }
                | CollectError::InvalidValue { .. }
                | CollectError::Json(_)
        )
    }
}

/// Errors a sink may report when asked to add an entry.
#[derive(Error, Debug)]
pub enum SinkError {
    /// Reading the source file or writing the destination failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An entry with the same name was already added.
    #[error("duplicate entry: {0}")]
    Duplicate(String),

    /// The sink refused the entry for another reason.
    #[error("rejected: {0}")]
    Rejected(String),
}

/// Result type alias for collection operations.
pub type Result<T> = std::result::Result<T, CollectError>;
