//! Error types for taxrates
//!
//! Defines a single error enum covering all failure modes across the crate.
//! Uses thiserror for ergonomic error handling. The hooks layer never
//! catches or transforms these; they surface to the consumer unaltered.

use thiserror::Error;

/// Result type alias for taxrates operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for taxrates operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid caller input (e.g. empty identifier)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Record not found (HTTP 404)
    #[error("Tax rate not found: {0}")]
    NotFound(String),

    /// Non-success API response other than 404
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error represents a missing record
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}
