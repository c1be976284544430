//! Error types for the shutter gateway

use thiserror::Error;

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the shutter gateway
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Home-automation backend failed after retries were exhausted
    #[error("backend error: {0}")]
    Backend(String),

    /// Directive was malformed or missing a required field
    #[error("invalid directive: {0}")]
    InvalidDirective(String),

    /// Directive named a value the gateway cannot act on
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// Conversational request could not be interpreted
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Resource not found
    #[error("not found: {0}")]
    NotFound(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Database error
    #[error("database error: {0}")]
    Database(String),

    /// `SQLite` error
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}
