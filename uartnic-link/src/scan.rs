//! Scan bookkeeping: dwell schedule and discovered access points.

use crate::radio::ScanRecord;
use uartnic_protocol::message::SSID_LEN;
use uartnic_protocol::ApInfo;
use std::time::Duration;

/// Kind of scan the radio is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanKind {
    /// Requested by the primary; repeats with growing dwell until stopped.
    Discovery,
    /// Short liveness check for the associated access point.
    Probe,
}

/// Parameters handed to the radio for one scan round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanParams {
    pub kind: ScanKind,
    /// Per-channel dwell bounds.
    pub dwell_min: Duration,
    pub dwell_max: Duration,
    pub show_hidden: bool,
}

/// Per-channel dwell for successive discovery rounds: starts short and
/// doubles each round up to a cap.
#[derive(Debug, Clone)]
pub struct DwellSchedule {
    initial: Duration,
    max: Duration,
    current: Option<Duration>,
}

impl DwellSchedule {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            current: None,
        }
    }

    /// Returns the dwell for the next round.
    pub fn next_dwell(&mut self) -> Duration {
        let next = match self.current {
            None => self.initial,
            Some(current) => (current * 2).min(self.max),
        };
        self.current = Some(next);
        next
    }

    pub fn reset(&mut self) {
        self.current = None;
    }
}

/// Access points found by the discovery scan, deduplicated by SSID.
#[derive(Debug, Clone)]
pub struct ScanResults {
    entries: Vec<ApInfo>,
    capacity: usize,
}

impl ScanResults {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Adds unseen SSIDs from a scan round. Returns how many were new.
    pub fn merge(&mut self, records: &[ScanRecord]) -> usize {
        let mut added = 0;
        for record in records {
            let info = ApInfo::new(&record.ssid, record.requires_password);
            if self.entries.iter().any(|e| e.ssid == info.ssid) {
                continue;
            }
            if self.entries.len() == self.capacity {
                tracing::warn!(capacity = self.capacity, "scan result storage is full");
                break;
            }
            tracing::info!(ssid = %info.ssid_str(), "found network");
            self.entries.push(info);
            added += 1;
        }
        added
    }

    pub fn get(&self, index: u8) -> Option<&ApInfo> {
        self.entries.get(index as usize)
    }

    /// Count as reported on the wire.
    pub fn count(&self) -> u8 {
        self.entries.len().min(u8::MAX as usize) as u8
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ApInfo> {
        self.entries.iter()
    }
}

/// Compares SSIDs the way they are stored: at most 32 bytes.
pub(crate) fn ssid_eq(a: &[u8], b: &[u8]) -> bool {
    a[..a.len().min(SSID_LEN)] == b[..b.len().min(SSID_LEN)]
}
