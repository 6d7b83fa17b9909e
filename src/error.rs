//! Error types for Cadence
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in Cadence
#[derive(Debug, Error)]
pub enum CadenceError {
    /// The task process could not be started
    #[error("Failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Too many consecutive launch failures; looping further is pointless
    #[error("Giving up after {count} consecutive launch failures (last: {last})")]
    LaunchFailuresExceeded { count: u32, last: String },

    /// Configuration is missing or inconsistent
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Invalid state transition
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Captured payload has no usable open-interest list
    #[error("Payload error: {0}")]
    Payload(String),

    /// Webhook delivery error
    #[error("Notify error: {0}")]
    Notify(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for Cadence operations
pub type Result<T> = std::result::Result<T, CadenceError>;
