//! Bridge error types.

use crate::config::ConfigError;
use thiserror::Error;
use uartnic_link::LinkError;
use uartnic_protocol::ProtocolError;

/// Bridge errors.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("link error: {0}")]
    Link(#[from] LinkError),

    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{task} task failed: {reason}")]
    Task { task: &'static str, reason: String },

    #[error("timed out waiting for {0}")]
    Timeout(&'static str),

    #[error("bridge shutting down")]
    ShuttingDown,
}

impl BridgeError {
    /// Returns whether this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            BridgeError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::Interrupted
                    | std::io::ErrorKind::WouldBlock
                    | std::io::ErrorKind::TimedOut
            ),
            BridgeError::Link(e) => e.is_retryable(),
            BridgeError::Timeout(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uartnic_link::RadioError;

    #[test]
    fn test_error_display() {
        let err = BridgeError::Task {
            task: "radio",
            reason: "panicked".to_string(),
        };
        assert_eq!(err.to_string(), "radio task failed: panicked");

        let err = BridgeError::from(ConfigError::ValidationError("bad".to_string()));
        assert_eq!(err.to_string(), "configuration validation failed: bad");
    }

    #[test]
    fn test_retryable() {
        let timed_out = std::io::Error::new(std::io::ErrorKind::TimedOut, "slow");
        assert!(BridgeError::from(timed_out).is_retryable());
        let gone = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
        assert!(!BridgeError::from(gone).is_retryable());
        assert!(BridgeError::from(LinkError::from(RadioError::Busy("scan"))).is_retryable());
        assert!(BridgeError::Timeout("device info").is_retryable());
        assert!(!BridgeError::ShuttingDown.is_retryable());
    }
}
