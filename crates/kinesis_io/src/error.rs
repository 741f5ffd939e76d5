//! Error types for the kinesis_io crate.
//!
//! Covers checkpoint files, the generation history log and the genome
//! codecs.

use thiserror::Error;

/// Main error type for kinesis_io operations.
#[derive(Error, Debug)]
pub enum IoError {
    /// Encoding or decoding errors outside serde_json
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// File system errors
    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Decoded data that is well-formed but semantically unusable, such as a
    /// genome that fails validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A checkpoint or log that does not exist
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Checkpoint written by an incompatible format version
    #[error("Unsupported checkpoint version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    /// Generic error with context
    #[error("{context}: {source}")]
    Context {
        context: String,
        source: Box<IoError>,
    },
}

/// Result type alias for kinesis_io operations.
pub type Result<T> = std::result::Result<T, IoError>;

impl IoError {
    #[must_use]
    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        Self::Serialization(msg.into())
    }

    #[must_use]
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    #[must_use]
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        Self::NotFound(resource.into())
    }

    /// Wraps an error with the operation that produced it.
    #[must_use]
    pub fn with_context<S: Into<String>>(self, context: S) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }
}
