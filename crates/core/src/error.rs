//! Core Error Types
//!
//! Errors raised by the dependency-light core crate. The main crate wraps
//! these transparently in its own error type.

use thiserror::Error;

/// Core error type for the Prompt Coach workspace.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A value outside its allowed range
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for core errors
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
