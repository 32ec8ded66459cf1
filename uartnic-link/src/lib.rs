//! # uartnic-link
//!
//! Connectivity policy for the wireless co-processor.
//!
//! This crate provides:
//! - The [`Radio`] abstraction over the association stack
//! - Reconnect with bounded retries
//! - Access point discovery with a growing dwell schedule
//! - Liveness probing after inbound inactivity

pub mod error;
pub mod link;
pub mod radio;
pub mod scan;

pub use error::{LinkError, RadioError};
pub use link::{LinkCommand, LinkConfig, LinkManager, LinkNotice, LinkState};
pub use radio::{accept_inbound, ActivityMonitor, Radio, RadioEvent, ScanRecord};
pub use scan::{DwellSchedule, ScanKind, ScanParams, ScanResults};
