//! Error types for the CLI application.

use redline_domain::ValidationError;
use redline_service::SettingsError;
use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Settings could not be loaded or are incomplete
    #[error("Configuration error: {0}")]
    Settings(#[from] SettingsError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Input file missing
    #[error("{what} not found: {path}")]
    FileNotFound {
        /// Which input
        what: &'static str,
        /// Path as given
        path: String,
    },

    /// Pipeline returned an error envelope
    #[error("Comparison failed: {0}")]
    ComparisonFailed(String),

    /// JSON did not satisfy the change-result schema
    #[error("Validation error: {0}")]
    ValidationFailed(#[from] ValidationError),
}
