//! Streaming deframer.
//!
//! Turns an unframed, arbitrarily chunked byte stream into dispatched
//! messages. Control payloads are buffered in a fixed buffer; non-empty
//! packets are streamed to the handler's [`PacketTunnel`]. Memory use is
//! bounded regardless of input.
//!
//! ```text
//! AwaitingIntron --intron--> AwaitingHeader --valid--> ReceivingPayload --done--> dispatch
//!       ^                          |   \--declined--> DiscardingPayload --done--+
//!       |                       invalid                                        |
//!       +--------------------------+-------------------------------------------+
//! ```

use crate::error::ProtocolError;
use crate::frame::Checksum;
use crate::message::{
    Header, Intron, Message, MessageKind, CHECKSUM_SIZE, DEFAULT_INTRON, HEADER_SIZE,
    INTRON_SIZE,
};
use crate::tunnel::PacketTunnel;
use crate::MAX_CONTROL_PAYLOAD;

/// Receives deframed messages.
///
/// Every kind has a default implementation that logs the message as
/// unexpected, so an endpoint only overrides the kinds it consumes.
/// Messages are delivered even when their checksum failed.
pub trait MessageHandler: PacketTunnel {
    fn on_device_info(&mut self, message: &Message<'_>) {
        unexpected(message);
    }

    fn on_client_config(&mut self, message: &Message<'_>) {
        unexpected(message);
    }

    /// Zero-length PACKET_V2.
    fn on_link_status(&mut self, message: &Message<'_>) {
        unexpected(message);
    }

    fn on_scan_start(&mut self, message: &Message<'_>) {
        unexpected(message);
    }

    fn on_scan_stop(&mut self, message: &Message<'_>) {
        unexpected(message);
    }

    fn on_scan_ap_count(&mut self, message: &Message<'_>) {
        unexpected(message);
    }

    fn on_scan_ap_get(&mut self, message: &Message<'_>) {
        unexpected(message);
    }

    /// A header failed validation. The deframer resets right after.
    fn on_invalid(&mut self, error: &ProtocolError) {
        tracing::warn!(%error, "invalid message header");
    }
}

fn unexpected(message: &Message<'_>) {
    tracing::warn!(
        kind = %message.header.kind,
        size = message.header.payload_size,
        "unexpected message for this endpoint"
    );
}

fn dispatch<H: MessageHandler>(handler: &mut H, message: &Message<'_>) {
    match message.header.kind {
        MessageKind::DeviceInfoV2 => handler.on_device_info(message),
        MessageKind::ClientConfigV2 => handler.on_client_config(message),
        MessageKind::PacketV2 => handler.on_link_status(message),
        MessageKind::ScanStart => handler.on_scan_start(message),
        MessageKind::ScanStop => handler.on_scan_stop(message),
        MessageKind::ScanApCount => handler.on_scan_ap_count(message),
        MessageKind::ScanApGet => handler.on_scan_ap_get(message),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeframerState {
    AwaitingIntron,
    AwaitingHeader,
    ReceivingPayload,
    DiscardingPayload,
}

/// Counters kept by a deframer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeframerStats {
    pub dispatched: u64,
    pub streamed: u64,
    pub invalid: u64,
    pub checksum_failures: u64,
    pub discarded: u64,
    pub abandoned: u64,
}

/// Deframer for one serial connection. Owns its handler.
pub struct Deframer<H> {
    handler: H,
    intron: Intron,
    state: DeframerState,
    window: [u8; INTRON_SIZE],
    window_len: usize,
    prelude: [u8; HEADER_SIZE + CHECKSUM_SIZE],
    prelude_len: usize,
    header: Option<Header>,
    transmitted: u32,
    checksum: Checksum,
    payload: [u8; MAX_CONTROL_PAYLOAD],
    received: usize,
    stream_open: bool,
    stats: DeframerStats,
}

impl<H: MessageHandler> Deframer<H> {
    pub fn new(handler: H) -> Self {
        Self::with_intron(handler, DEFAULT_INTRON)
    }

    pub fn with_intron(handler: H, intron: Intron) -> Self {
        Self {
            handler,
            intron,
            state: DeframerState::AwaitingIntron,
            window: [0u8; INTRON_SIZE],
            window_len: 0,
            prelude: [0u8; HEADER_SIZE + CHECKSUM_SIZE],
            prelude_len: 0,
            header: None,
            transmitted: 0,
            checksum: Checksum::new(),
            payload: [0u8; MAX_CONTROL_PAYLOAD],
            received: 0,
            stream_open: false,
            stats: DeframerStats::default(),
        }
    }

    /// Consumes a chunk of any size and alignment, dispatching every message
    /// it completes.
    pub fn process(&mut self, mut data: &[u8]) {
        while !data.is_empty() {
            let consumed = match self.state {
                DeframerState::AwaitingIntron => self.scan_intron(data),
                DeframerState::AwaitingHeader => self.read_prelude(data),
                DeframerState::ReceivingPayload => self.read_payload(data),
                DeframerState::DiscardingPayload => self.discard_payload(data),
            };
            data = &data[consumed..];
        }
    }

    /// Drops any partial message and waits for the next intron. A stream
    /// begun but not committed is abandoned.
    pub fn reset(&mut self) {
        if self.stream_open {
            self.stream_open = false;
            self.stats.abandoned += 1;
            self.handler.abandon();
        }
        self.state = DeframerState::AwaitingIntron;
        self.window_len = 0;
        self.prelude_len = 0;
        self.header = None;
        self.transmitted = 0;
        self.received = 0;
        self.checksum = Checksum::new();
    }

    pub fn intron(&self) -> Intron {
        self.intron
    }

    /// Replaces the intron searched for from the next message on.
    pub fn set_intron(&mut self, intron: Intron) {
        self.intron = intron;
    }

    pub fn state(&self) -> DeframerState {
        self.state
    }

    pub fn stats(&self) -> DeframerStats {
        self.stats
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn into_handler(self) -> H {
        self.handler
    }

    fn scan_intron(&mut self, data: &[u8]) -> usize {
        for (i, &byte) in data.iter().enumerate() {
            if self.window_len == INTRON_SIZE {
                self.window.copy_within(1.., 0);
                self.window[INTRON_SIZE - 1] = byte;
            } else {
                self.window[self.window_len] = byte;
                self.window_len += 1;
            }

            if self.window_len == INTRON_SIZE && self.window == *self.intron.as_bytes() {
                self.window_len = 0;
                self.checksum = Checksum::seeded(&self.intron);
                self.state = DeframerState::AwaitingHeader;
                return i + 1;
            }
        }
        data.len()
    }

    fn read_prelude(&mut self, data: &[u8]) -> usize {
        let take = (self.prelude.len() - self.prelude_len).min(data.len());
        self.prelude[self.prelude_len..self.prelude_len + take].copy_from_slice(&data[..take]);
        self.prelude_len += take;
        if self.prelude_len == self.prelude.len() {
            self.on_prelude();
        }
        take
    }

    fn on_prelude(&mut self) {
        let p = self.prelude;
        let raw = [p[0], p[1], p[2], p[3]];
        self.transmitted = u32::from_be_bytes([p[4], p[5], p[6], p[7]]);
        self.checksum.update(&raw);

        let header = match Header::decode(&raw) {
            Ok(header) => header,
            Err(error) => {
                // The declared payload is not skipped: the next intron may
                // sit inside it.
                self.stats.invalid += 1;
                self.handler.on_invalid(&error);
                self.reset();
                return;
            }
        };

        tracing::trace!(kind = %header.kind, size = header.payload_size, "message header");
        self.header = Some(header);
        self.received = 0;
        self.state = DeframerState::ReceivingPayload;

        if header.is_streamed() {
            debug_assert!(!self.stream_open, "stream begun while another is open");
            if self.stream_open {
                tracing::error!("stream begun while another is open, abandoning the old one");
                self.stream_open = false;
                self.stats.abandoned += 1;
                self.handler.abandon();
            }
            if self.handler.begin(&header) {
                self.stream_open = true;
            } else {
                self.state = DeframerState::DiscardingPayload;
            }
        }

        if header.payload_size == 0 {
            self.complete();
        }
    }

    fn read_payload(&mut self, data: &[u8]) -> usize {
        let Some(header) = self.header else {
            self.reset();
            return 0;
        };
        let take = (header.payload_size as usize - self.received).min(data.len());
        let chunk = &data[..take];
        self.checksum.update(chunk);

        if self.stream_open {
            self.handler.update(chunk);
        } else {
            debug_assert!(self.received + take <= MAX_CONTROL_PAYLOAD);
            self.payload[self.received..self.received + take].copy_from_slice(chunk);
        }
        self.received += take;

        if self.received == header.payload_size as usize {
            self.complete();
        }
        take
    }

    fn discard_payload(&mut self, data: &[u8]) -> usize {
        let Some(header) = self.header else {
            self.reset();
            return 0;
        };
        let take = (header.payload_size as usize - self.received).min(data.len());
        self.checksum.update(&data[..take]);
        self.received += take;

        if self.received == header.payload_size as usize {
            self.complete();
        }
        take
    }

    fn complete(&mut self) {
        let Some(header) = self.header else {
            self.reset();
            return;
        };
        let computed = self.checksum.value();
        let valid = computed == self.transmitted;
        if !valid {
            self.stats.checksum_failures += 1;
            tracing::debug!(
                kind = %header.kind,
                expected = self.transmitted,
                actual = computed,
                "checksum mismatch"
            );
        }

        if self.state == DeframerState::DiscardingPayload {
            self.stats.discarded += 1;
            tracing::debug!(
                kind = %header.kind,
                size = header.payload_size,
                checksum_valid = valid,
                "discarded payload"
            );
        } else if self.stream_open {
            self.stream_open = false;
            self.stats.streamed += 1;
            self.handler.commit(&header, valid);
        } else {
            let message = Message {
                header,
                payload: &self.payload[..self.received],
                transmitted_checksum: self.transmitted,
                computed_checksum: computed,
            };
            self.stats.dispatched += 1;
            dispatch(&mut self.handler, &message);

            // Applies to the next message, never the one just handled.
            if valid && header.kind == MessageKind::ClientConfigV2 {
                if let Ok(intron) = Intron::from_slice(message.payload) {
                    if intron != self.intron {
                        tracing::info!(%intron, "intron changed");
                    }
                    self.intron = intron;
                }
            }
        }

        self.reset();
    }
}
