//! Error types for BioMiner.
//!
//! This module defines a unified error enum that covers configuration
//! resolution, provider dispatch, I/O, and LLM transport errors.

use thiserror::Error;

/// Unified error type for BioMiner.
///
/// All fallible functions return `Result<T, AppError>`.
/// Validation errors are raised at construction time; there is no
/// partially-built configuration.
#[derive(Error, Debug)]
pub enum AppError {
    /// Provider is not recognized and no `base_url` was given
    #[error("Unsupported provider: {0} (set base_url to use a custom endpoint)")]
    UnsupportedProvider(String),

    /// No api key given and no fallback could be resolved
    #[error("Missing api_key for provider '{provider}'")]
    MissingApiKey { provider: String },

    /// Numeric field outside its allowed range
    #[error("Field '{field}' out of range: {message}")]
    FieldRange {
        field: &'static str,
        message: String,
    },

    /// Field value that cannot be parsed or is empty
    #[error("Invalid value for '{field}': {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },

    /// Provider client support was not compiled in
    #[error("Missing dependency for provider '{0}': enable the matching cargo feature")]
    MissingDependency(String),

    /// Configuration source errors (unreadable env file, bad log filter)
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// LLM provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
