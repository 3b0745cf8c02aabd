//! Error types for cuaderno-core

use thiserror::Error;

/// Result type alias for cuaderno operations
pub type Result<T> = std::result::Result<T, CuadernoError>;

/// Main error type returned to the presentation layer
#[derive(Error, Debug)]
pub enum CuadernoError {
    /// A category or item id that does not exist in the dataset
    #[error("Not found: {0}")]
    NotFound(String),

    /// User input that fails validation (empty key, value or name)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Import or remote payload with the wrong shape
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    /// Wrong access code at the gate
    #[error("Access denied")]
    AccessDenied,

    /// Persistence-related errors
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Remote mirror errors
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Local store errors
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// IO error
    #[error("IO error: {0}")]
    Io(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Remote mirror errors. All of them are soft failures for the data service.
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Unexpected status: {0}")]
    Status(u16),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Configuration loading and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("TOML parse error: {0}")]
    Parse(String),

    #[error("Invalid value: {0}")]
    Invalid(String),
}

impl From<std::io::Error> for PersistenceError {
    fn from(err: std::io::Error) -> Self {
        PersistenceError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        PersistenceError::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            RemoteError::Parse(err.to_string())
        } else {
            RemoteError::RequestFailed(err.to_string())
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

impl From<serde_json::Error> for CuadernoError {
    fn from(err: serde_json::Error) -> Self {
        CuadernoError::MalformedDocument(err.to_string())
    }
}
