//! Error types for the promptd server.
//!
//! This module defines a unified error enum that covers all error categories
//! in the server: configuration, I/O, template loading, registry lookups,
//! management operations and the MCP transports.

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for promptd.
///
/// All fallible functions in the workspace return `Result<T, AppError>`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The template root could not be walked
    #[error("Load error: {0}")]
    Load(String),

    /// A template failed to parse or validate
    #[error("Template error: {0}")]
    Template(String),

    /// Lookup of a tool, prompt or template that is not registered
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or malformed call arguments
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// A new template file was written but the reload failed; the file was removed again
    #[error(
        "prompt file saved to {}, but failed to reload prompts: {reason}. The new file has been removed",
        path.display()
    )]
    ReloadRolledBack { path: PathBuf, reason: String },

    /// A new template file was written, the reload failed and the file could not be removed
    #[error(
        "prompt file saved to {}, but failed to reload prompts ({reason}) and also failed to remove it ({cleanup}); delete it manually",
        path.display()
    )]
    ReloadOrphaned {
        path: PathBuf,
        reason: String,
        cleanup: String,
    },

    /// MCP session failures
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
