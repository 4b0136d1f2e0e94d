//! Error types for the Reminder API

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum CoreError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// API error
    #[error("API error: {0}")]
    Api(String),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Requested reminder (or a non-empty result set) does not exist
    #[error("{0} not found: {1}")]
    NotFound(&'static str, String),

    /// Create payload is missing a field or carries the wrong type
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for Core operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Whether this error means "nothing matched" rather than a failure
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound(..))
    }
}
