//! Error types for completion configuration and table loading
//!
//! The query path itself never fails: every anomaly there degrades to
//! "no completion offered". Errors only surface while loading settings or
//! keyword tables.

use thiserror::Error;

/// Errors that can occur while loading completion configuration
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid keyword table: {0}")]
    InvalidTable(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type for fallible completion operations
pub type CompletionResult<T> = Result<T, CompletionError>;
