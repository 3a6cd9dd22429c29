//! Error types for the queue worker

use redline_service::SettingsError;
use thiserror::Error;

/// Errors that stop the worker or drop a message
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Settings could not be loaded or validated
    #[error("Configuration error: {0}")]
    Config(#[from] SettingsError),

    /// Broker connection, channel or delivery failure
    #[error("Broker error: {0}")]
    Broker(#[from] lapin::Error),

    /// Inbound message is not a job request
    #[error("Malformed job request: {0}")]
    Malformed(String),

    /// Reply could not be encoded
    #[error("Failed to encode reply: {0}")]
    Encode(#[from] serde_json::Error),
}
