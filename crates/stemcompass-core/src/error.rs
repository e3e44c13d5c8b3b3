//! Core error types for stemcompass-core.
//!
//! This module defines the error hierarchy using thiserror. Collaborator
//! failures carry their own taxonomy so callers can tell an exhausted quota
//! apart from an ordinary network or payload failure.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for stemcompass-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Failures reported by (or while talking to) a backend collaborator
    #[error("Collaborator error: {0}")]
    Collaborator(#[from] CollaboratorError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

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

    /// Stored row could not be decoded
    #[error("Corrupt record '{id}': {message}")]
    CorruptRecord { id: String, message: String },

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Data directory could not be resolved or created
    #[error("Failed to prepare data directory {path}: {message}")]
    DataDir { path: PathBuf, message: String },

    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Key does not exist in the configuration tree
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Failures of the external collaborators (question source, response
/// recorder, analysis service, account service).
#[derive(Error, Debug)]
pub enum CollaboratorError {
    /// The AI-backed service rejected the call because its quota is spent.
    /// Retriable later; never retried automatically.
    #[error("{service}: quota exceeded: {message}")]
    QuotaExceeded { service: String, message: String },

    /// Network or server failure.
    #[error("{service}: request failed: {message}")]
    Transient {
        service: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The collaborator answered, but the payload was malformed or incomplete.
    #[error("{service}: invalid response: {message}")]
    Validation { service: String, message: String },
}

impl CollaboratorError {
    pub fn transient(service: &str, message: impl Into<String>) -> Self {
        CollaboratorError::Transient {
            service: service.to_string(),
            message: message.into(),
            source: None,
        }
    }

    pub fn validation(service: &str, message: impl Into<String>) -> Self {
        CollaboratorError::Validation {
            service: service.to_string(),
            message: message.into(),
        }
    }

    pub fn quota(service: &str, message: impl Into<String>) -> Self {
        CollaboratorError::QuotaExceeded {
            service: service.to_string(),
            message: message.into(),
        }
    }

    pub fn is_quota(&self) -> bool {
        matches!(self, CollaboratorError::QuotaExceeded { .. })
    }

    /// Message suitable for showing to the student.
    pub fn user_message(&self) -> String {
        match self {
            CollaboratorError::QuotaExceeded { .. } => {
                "The AI service quota has been exhausted. Please try again later.".to_string()
            }
            CollaboratorError::Transient { .. } => {
                "Something went wrong while contacting the server. Please retry.".to_string()
            }
            CollaboratorError::Validation { .. } => {
                "The server returned an unexpected response. Please retry.".to_string()
            }
        }
    }
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A question did not carry exactly four options and four categories
    #[error("Question {index} must have exactly 4 options and 4 categories (got {options} options, {categories} categories)")]
    MalformedQuestion {
        index: usize,
        options: usize,
        categories: usize,
    },

    /// Unrecognized category label
    #[error("Unknown STEM category: '{0}'")]
    UnknownCategory(String),

    /// Empty collection
    #[error("Empty collection: {0}")]
    EmptyCollection(String),

    /// Restored session state that contradicts itself
    #[error("Inconsistent session: {0}")]
    InconsistentSession(String),

    /// Out of bounds
    #[error("Index {index} out of bounds for {collection} (length: {len})")]
    OutOfBounds {
        collection: String,
        index: usize,
        len: usize,
    },
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
