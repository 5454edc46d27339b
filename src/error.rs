//! Crest error types

use std::time::Duration;

/// Crest error types.
///
/// The decision path never surfaces these to callers: the resolver folds
/// every upstream error into the safe fallback. They show up at the edges,
/// from classifier implementations, configuration loading, and the builder.
#[derive(Debug, thiserror::Error)]
pub enum CrestError {
    // Upstream/network errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("upstream timed out after {0:?}")]
    Timeout(Duration),

    #[error("authentication failed")]
    AuthenticationFailed,

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Soft errors
    #[error("empty response from classifier")]
    EmptyResponse,

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl CrestError {
    /// Short, stable label used for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            CrestError::Http(_) => "http",
            CrestError::Api { .. } => "api",
            CrestError::Timeout(_) => "timeout",
            CrestError::AuthenticationFailed => "auth",
            CrestError::Json(_) => "json",
            CrestError::EmptyResponse => "empty_response",
            CrestError::Configuration(_) => "configuration",
        }
    }
}

/// Result type alias for Crest operations
pub type Result<T> = std::result::Result<T, CrestError>;
