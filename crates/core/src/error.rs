//! Error types for docpipe.
//!
//! This module defines the unified error enum that every docpipe crate
//! converts into at its boundary. Library crates keep their own narrow
//! error enums (registry, selector, schema) and provide `From` impls into
//! [`AppError`] so the CLI can propagate everything with `?`.

use thiserror::Error;

/// Unified error type for docpipe.
///
/// All fallible entry points return `Result<T, AppError>`.
/// We never panic; errors must be represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Prompt registry and version resolution errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Extraction note and result contract errors
    #[error("Extraction error: {0}")]
    Extraction(String),

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
