//! Error types for the coursecoach engine
//!
//! Configuration errors are fatal at startup; transient external-call
//! errors are recovered locally via fallback; malformed input skips the
//! single container and the batch continues.

use thiserror::Error;

/// Main error type for the atomization and governance engine
#[derive(Error, Debug)]
pub enum CoachError {
    /// Invalid canonical reference inputs (day/sequence must be positive)
    #[error("Invalid reference component {component}: {value}")]
    InvalidReference { component: &'static str, value: u32 },

    /// Canonical reference string that cannot be parsed back to components
    #[error("Malformed canonical reference: {0}")]
    MalformedReference(String),

    /// Source document whose filename does not match the expected pattern
    #[error("Unrecognized document filename: {0}")]
    UnrecognizedFilename(String),

    /// Atomization produced no nodes for a container
    #[error("Document atomized to zero nodes: {0}")]
    EmptyAtomization(String),

    /// Content store failures
    #[error("Content store error: {0}")]
    StoreError(String),

    /// LLM service failures (timeouts, malformed responses)
    #[error("LLM service error: {0}")]
    LlmError(String),

    /// Generation exceeded its hard ceiling
    #[error("Operation timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Missing store or LLM credentials at startup
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Generic errors with context
    #[error("Engine error: {0}")]
    Generic(String),
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, CoachError>;

impl From<anyhow::Error> for CoachError {
    fn from(err: anyhow::Error) -> Self {
        CoachError::Generic(err.to_string())
    }
}
