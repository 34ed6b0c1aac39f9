//! Core error types for subcue-core.
//!
//! This module defines the error hierarchy using thiserror. Usage errors
//! (calling `pause` while not running and so on) are not errors at all:
//! the director logs and ignores them. Only invalid arguments and
//! collaborator failures surface here.

use std::path::PathBuf;
use thiserror::Error;

use crate::entry::Millis;

/// Core error type for subcue-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Director control errors
    #[error("Director error: {0}")]
    Director(#[from] DirectorError),

    /// SRT parsing errors
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Rejected `start` arguments. The director state is left untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectorError {
    /// The entry store has no entries
    #[error("No subtitle entries, cannot start")]
    EmptyStore,

    /// The requested start instant lies outside `[0, last_end]`
    #[error("Start instant {instant}ms is out of range [0, {last_end}]ms")]
    StartOutOfRange { instant: Millis, last_end: Millis },
}

/// SRT parsing errors.
#[derive(Error, Debug)]
pub enum ParseError {
    /// Input contained no usable subtitle block
    #[error("No subtitle entries found")]
    Empty,

    /// Failed to read the source file
    #[error("Failed to read subtitles from {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed timestamp
    #[error("Invalid timestamp '{0}'")]
    InvalidTimestamp(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn director_error_messages_name_the_range() {
        let err = DirectorError::StartOutOfRange {
            instant: 5000,
            last_end: 2000,
        };
        assert_eq!(
            err.to_string(),
            "Start instant 5000ms is out of range [0, 2000]ms"
        );
    }

    #[test]
    fn core_error_wraps_sub_errors() {
        let err: CoreError = DirectorError::EmptyStore.into();
        assert!(matches!(err, CoreError::Director(DirectorError::EmptyStore)));
        assert!(err.to_string().starts_with("Director error:"));

        let err: CoreError = ParseError::Empty.into();
        assert!(matches!(err, CoreError::Parse(ParseError::Empty)));
    }

    #[test]
    fn toml_errors_become_parse_failed() {
        let toml_err = toml::from_str::<toml::Value>("= broken").unwrap_err();
        let err: ConfigError = toml_err.into();
        assert!(matches!(err, ConfigError::ParseFailed(_)));
    }
}
