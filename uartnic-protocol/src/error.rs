//! Protocol error types.

use crate::message::MessageKind;
use thiserror::Error;

/// Errors raised while validating, encoding or decoding protocol messages.
///
/// Framing errors found by the deframer are never returned from
/// `process`; they are handed to the handler's `on_invalid` and the
/// deframer resynchronizes on the next intron.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("unknown message kind: {0}")]
    UnknownKind(u8),

    #[error("invalid payload length for {kind}: {len} bytes")]
    InvalidLength { kind: MessageKind, len: u16 },

    #[error("payload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("truncated {field}: need {needed} more bytes")]
    Truncated { field: &'static str, needed: usize },

    #[error("checksum mismatch: expected {expected:#x}, got {actual:#x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("unexpected message kind: {0}")]
    UnexpectedKind(MessageKind),
}

impl ProtocolError {
    /// Returns true for errors detected from the header alone.
    pub fn is_framing(&self) -> bool {
        matches!(
            self,
            ProtocolError::UnknownKind(_) | ProtocolError::InvalidLength { .. }
        )
    }
}
