//! Vedrfolnir error types

use std::time::Duration;

/// Vedrfolnir error types
#[derive(Debug, thiserror::Error)]
pub enum VedrError {
    // Provider/network errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("model not found: {0}")]
    ModelNotFound(String),

    #[error("empty response from model")]
    EmptyResponse,

    // Reply decoding
    #[error("decode error: {0}")]
    Decode(String),

    // Dataset errors
    #[error("data format error: {0}")]
    DataFormat(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Action stubs
    #[error("unknown function: {0}")]
    UnknownFunction(String),

    #[error("validation failed for {function}: {message}")]
    Validation { function: String, message: String },

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl VedrError {
    /// Whether retrying the same request might succeed.
    ///
    /// Rate limits, transport failures, server-side (5xx) errors and empty
    /// replies are transient. Everything else is permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            VedrError::RateLimited { .. } | VedrError::Http(_) | VedrError::EmptyResponse => true,
            VedrError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Provider-suggested wait before retrying, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            VedrError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

/// Result type alias for Vedrfolnir operations
pub type Result<T> = std::result::Result<T, VedrError>;
