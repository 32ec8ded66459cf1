//! Streaming of large payloads.
//!
//! PACKET_V2 payloads can be up to 64 KiB, far more than the deframer
//! buffers. They are handed to a [`PacketTunnel`] chunk by chunk as they
//! arrive instead.

use crate::message::Header;
use bytes::{Bytes, BytesMut};

/// Receives a streamed payload.
///
/// For every message the deframer calls `begin` once. If it returns true,
/// `update` follows zero or more times and then exactly one of `commit` (the
/// full payload arrived) or `abandon` (the stream was cut short by a reset).
pub trait PacketTunnel {
    /// Returns false when there is no room for the payload; the message is
    /// then discarded without further calls.
    fn begin(&mut self, header: &Header) -> bool;

    fn update(&mut self, chunk: &[u8]);

    fn commit(&mut self, header: &Header, checksum_valid: bool);

    fn abandon(&mut self);
}

/// Collects a stream into a contiguous buffer bounded by `max_frame`.
#[derive(Debug)]
pub struct FrameAssembler {
    buf: BytesMut,
    max_frame: usize,
    active: bool,
}

impl FrameAssembler {
    pub fn new(max_frame: usize) -> Self {
        Self {
            buf: BytesMut::new(),
            max_frame,
            active: false,
        }
    }

    pub fn max_frame(&self) -> usize {
        self.max_frame
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Starts a new frame; declines frames above the configured maximum.
    pub fn begin(&mut self, header: &Header) -> bool {
        let size = header.payload_size as usize;
        if size > self.max_frame {
            tracing::debug!(size, max = self.max_frame, "declining oversized frame");
            return false;
        }
        self.buf.clear();
        self.buf.reserve(size);
        self.active = true;
        true
    }

    pub fn update(&mut self, chunk: &[u8]) {
        if self.active {
            self.buf.extend_from_slice(chunk);
        }
    }

    /// Finishes the current frame. Frames with a bad checksum are dropped.
    pub fn finish(&mut self, checksum_valid: bool) -> Option<Bytes> {
        if !self.active {
            return None;
        }
        self.active = false;
        let frame = self.buf.split().freeze();
        if !checksum_valid {
            tracing::warn!(len = frame.len(), "dropping frame with bad checksum");
            return None;
        }
        Some(frame)
    }

    pub fn abandon(&mut self) {
        self.active = false;
        self.buf.clear();
    }
}
