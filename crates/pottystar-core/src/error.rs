//! Core error types for pottystar-core.
//!
//! Nothing in the timer core is fatal: audio and storage errors are logged
//! and recovered where they happen. These types exist so the boundaries
//! (config loading, the CLI, input validation) can report what went wrong.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for pottystar-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Audio output errors
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
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

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Audio output errors.
///
/// The tone sequencer never propagates these; they are logged and the cue
/// is treated as played.
#[derive(Error, Debug)]
pub enum AudioError {
    /// No output device could be opened
    #[error("Audio output unavailable: {0}")]
    Unavailable(String),

    /// The device rejected a voice
    #[error("Playback failed: {0}")]
    Playback(String),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Custom duration input that is not an integer
    #[error("'{0}' is not a whole number of minutes")]
    NotANumber(String),

    /// Custom duration outside the accepted range
    #[error("Duration of {minutes} minutes is outside {min}..={max}")]
    DurationOutOfRange { minutes: i64, min: u32, max: u32 },

    /// Duration that is not one of the configured presets
    #[error("{0} minutes is not a preset interval")]
    UnknownPreset(u32),

    /// Outcome chosen while no countdown has expired
    #[error("No expired countdown is waiting for an outcome")]
    NoPendingOutcome,
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_name_the_bounds() {
        let err = ValidationError::DurationOutOfRange {
            minutes: 121,
            min: 1,
            max: 120,
        };
        assert_eq!(
            err.to_string(),
            "Duration of 121 minutes is outside 1..=120"
        );
    }

    #[test]
    fn rusqlite_errors_become_query_failures() {
        let err: DatabaseError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, DatabaseError::QueryFailed(_)));
    }
}
