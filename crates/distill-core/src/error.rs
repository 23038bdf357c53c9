//! Core error types for distill-core.
//!
//! Collaborator failures (store, notifier) are reported through these types
//! but callers on the timer path log and swallow them; only the CLI surfaces
//! them to the user.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to open the persisted state.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Persisted store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Persisted store errors.
#[derive(Error, Debug)]
pub enum StoreError {
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

    /// Write attempted before the store finished loading
    #[error("Store is not ready to accept writes")]
    NotReady,

    /// Stored state could not be encoded or decoded
    #[error("Stored state is not valid JSON: {0}")]
    Encoding(#[from] serde_json::Error),
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

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Data directory could not be created
    #[error("Data directory unavailable: {0}")]
    DataDir(#[source] std::io::Error),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Task title is empty or whitespace
    #[error("Task title must not be empty")]
    EmptyTitle,

    /// Session length outside the accepted range
    #[error("Duration must be between {min} and {max} minutes, got {got}")]
    DurationOutOfRange { min: u32, max: u32, got: u32 },

    /// Unknown enum label or ordinal
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// Unknown notification action id
    #[error("Unknown notification action: {0}")]
    UnknownAction(String),
}

/// Notification collaborator errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// Platform refused to schedule the alert
    #[error("Failed to schedule alert: {0}")]
    ScheduleFailed(String),

    /// Platform refused to cancel the alert
    #[error("Failed to cancel alert: {0}")]
    CancelFailed(String),

    /// User denied notification permission
    #[error("Notification permission denied")]
    PermissionDenied,
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked {
                    StoreError::Locked
                } else {
                    StoreError::QueryFailed(err.to_string())
                }
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}
