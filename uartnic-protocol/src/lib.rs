//! # uartnic-protocol
//!
//! Data-link protocol between a primary controller and a wireless
//! co-processor sharing one serial line.
//!
//! This crate provides:
//! - The message vocabulary and its length rules
//! - CRC-32 checked framing behind a runtime-changeable intron
//! - A streaming deframer that resynchronizes after corruption
//! - The packet tunnel contract for payloads too large to buffer

pub mod deframer;
pub mod error;
pub mod frame;
pub mod message;
pub mod tunnel;

pub use deframer::{Deframer, DeframerState, DeframerStats, MessageHandler};
pub use error::ProtocolError;
pub use frame::{checksum, Checksum, Frame};
pub use message::{
    ApInfo, ClientConfig, Header, Intron, MacAddress, Message, MessageKind, AP_INDEX_OUT_OF_RANGE,
    DEFAULT_INTRON, INTRON_SIZE, MAC_SIZE, PRELUDE_SIZE,
};
pub use tunnel::{FrameAssembler, PacketTunnel};

/// Protocol version announced in DEVICE_INFO_V2.
pub const PROTOCOL_VERSION: u8 = 13;

/// Largest payload a header can declare.
pub const MAX_PAYLOAD_SIZE: usize = u16::MAX as usize;

/// Size of the deframer's buffer for non-streamed payloads: a client config
/// whose length bytes are both at their maximum.
pub const MAX_CONTROL_PAYLOAD: usize = INTRON_SIZE + 2 + 2 * u8::MAX as usize;
