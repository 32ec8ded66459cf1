//! Link error types.

use thiserror::Error;

/// Errors reported by a radio implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RadioError {
    #[error("radio not started")]
    NotStarted,

    #[error("radio busy: {0}")]
    Busy(&'static str),

    #[error("radio rejected {operation}: {reason}")]
    Rejected {
        operation: &'static str,
        reason: String,
    },

    #[error("transmit failed: {0}")]
    Transmit(String),
}

/// Errors from the link manager.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("radio error: {0}")]
    Radio(#[from] RadioError),

    #[error("scan already in progress")]
    ScanInProgress,

    #[error("invalid link configuration: {0}")]
    InvalidConfig(String),
}

impl LinkError {
    /// Returns whether a later attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LinkError::Radio(RadioError::Busy(_)) | LinkError::ScanInProgress
        )
    }
}
