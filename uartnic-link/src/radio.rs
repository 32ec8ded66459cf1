//! Radio abstraction.
//!
//! The radio association stack is a black box. Operations are requests; their
//! outcome arrives later as a [`RadioEvent`]. Received network frames do not
//! pass through here: the driver hands them straight to the bridge queue.

use crate::error::RadioError;
use crate::scan::ScanParams;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uartnic_protocol::MacAddress;

/// Operations the link manager needs from the radio.
pub trait Radio: Send {
    /// Station hardware address.
    fn mac_address(&self) -> MacAddress;

    /// Applies new credentials and restarts the station. Any current
    /// association is dropped; [`RadioEvent::Started`] follows.
    fn configure(&mut self, ssid: &[u8], password: &[u8]) -> Result<(), RadioError>;

    fn connect(&mut self) -> Result<(), RadioError>;

    fn disconnect(&mut self) -> Result<(), RadioError>;

    /// Starts a scan; [`RadioEvent::ScanDone`] reports the result, also when
    /// the scan is stopped early.
    fn start_scan(&mut self, params: &ScanParams) -> Result<(), RadioError>;

    fn stop_scan(&mut self) -> Result<(), RadioError>;

    fn transmit(&mut self, frame: &[u8]) -> Result<(), RadioError>;
}

/// An access point seen during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRecord {
    pub bssid: MacAddress,
    pub ssid: Vec<u8>,
    pub requires_password: bool,
}

/// Asynchronous notifications from the radio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RadioEvent {
    Started,
    Associated { bssid: MacAddress, ssid: Vec<u8> },
    Disassociated,
    /// Scan finished or was stopped. A failed scan reports no records.
    ScanDone(Vec<ScanRecord>),
}

/// Time of the last inbound radio frame, shared between the receive path
/// and the link manager without locking.
#[derive(Debug, Clone)]
pub struct ActivityMonitor {
    base: Instant,
    last_ms: Arc<AtomicU64>,
}

impl ActivityMonitor {
    pub fn new() -> Self {
        Self::with_base(Instant::now())
    }

    pub fn with_base(base: Instant) -> Self {
        Self {
            base,
            last_ms: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn touch(&self) {
        self.touch_at(Instant::now());
    }

    pub fn touch_at(&self, at: Instant) {
        let ms = at.saturating_duration_since(self.base).as_millis() as u64;
        self.last_ms.fetch_max(ms, Ordering::Relaxed);
    }

    /// Time since the last inbound frame.
    pub fn idle_for(&self, now: Instant) -> Duration {
        let now_ms = now.saturating_duration_since(self.base).as_millis() as u64;
        Duration::from_millis(now_ms.saturating_sub(self.last_ms.load(Ordering::Relaxed)))
    }
}

impl Default for ActivityMonitor {
    fn default() -> Self {
        Self::new()
    }
}

/// Receive filter: unicast frames must be addressed to us. Frames too short
/// to carry a destination address are dropped.
pub fn accept_inbound(own: &MacAddress, frame: &[u8]) -> bool {
    match MacAddress::from_slice(frame) {
        Ok(dest) => dest.is_multicast() || dest == *own,
        Err(_) => false,
    }
}
