//! # uartnic-bridge
//!
//! Runtime for both ends of the serial link.
//!
//! This crate provides:
//! - Bounded, drop-on-full frame queues between the radio and serial domains
//! - The co-processor runtime: serial rx, serial tx and radio tasks
//! - The host-side NIC handler and message builders
//! - A serial stream over tty devices or TCP bridges
//! - Layered configuration (defaults, YAML file, environment)

pub mod config;
pub mod coprocessor;
pub mod error;
pub mod nic;
pub mod queue;
pub mod stream;

pub use config::{Config, ConfigError, HostConfig, QueueConfig, SerialConfig, SerialEndpoint};
pub use coprocessor::{write_frame, Bridge, BridgeStats, RadioIngress, SharedIntron, ShutdownHandle};
pub use error::BridgeError;
pub use nic::{rotate_intron, HostEncoder, HostEvent, HostNic, NicMode};
pub use queue::{frame_queue, FrameQueue, FrameSender, QueueStats};
pub use stream::SerialStream;
