//! Analysis Backend Types
//!
//! Error type shared by every analysis backend.

use thiserror::Error;

/// Errors raised by an analysis backend.
///
/// The engine never inspects transport details; it only propagates these as
/// batch failures. Retry and backoff belong above the service boundary.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AnalysisError {
    /// The backend is not configured or not reachable.
    #[error("backend unavailable: {message}")]
    Unavailable { message: String },

    /// Authentication failed (invalid or missing API key).
    #[error("authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// The requested model does not exist on the backend.
    #[error("model not found: {model}")]
    ModelNotFound { model: String },

    /// Rate limit exceeded.
    #[error("rate limited: {message}")]
    RateLimited {
        message: String,
        retry_after: Option<u32>,
    },

    /// The backend answered with something that is not an analysis result.
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },

    /// The backend returned a server-side failure.
    #[error("server error{}: {message}", .status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default())]
    ServerError {
        message: String,
        status: Option<u16>,
    },

    /// Any other error.
    #[error("{message}")]
    Other { message: String },
}

/// Result type alias for backend calls
pub type ServiceResult<T> = Result<T, AnalysisError>;

impl AnalysisError {
    /// Create an unavailable error
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable {
            message: msg.into(),
        }
    }
}
