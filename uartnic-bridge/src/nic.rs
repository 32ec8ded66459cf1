//! Host side of the serial link.
//!
//! [`HostNic`] consumes messages from the co-processor and reports them as
//! [`HostEvent`]s; [`HostEncoder`] builds the messages the host sends.

use crate::config::HostConfig;
use bytes::{Bytes, BytesMut};
use serde::Serialize;
use tokio::sync::mpsc;
use uartnic_protocol::{
    ApInfo, ClientConfig, Frame, FrameAssembler, Header, Intron, MacAddress, Message,
    MessageHandler, PacketTunnel, ProtocolError, AP_INDEX_OUT_OF_RANGE, DEFAULT_INTRON,
    INTRON_SIZE,
};
use uuid::Uuid;

/// Something the co-processor told us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    DeviceInfo {
        mac: MacAddress,
        version: u8,
        supported: bool,
    },
    /// Link flag changed between consecutive packets.
    LinkChanged(bool),
    /// Answer to a link poll.
    LinkStatus(bool),
    ApCount(u8),
    /// `None` when the requested index was out of range.
    ApInfo { index: u8, info: Option<ApInfo> },
    Frame(Bytes),
}

/// What the host believes the co-processor is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NicMode {
    WaitInit,
    WrongFirmware,
    NeedAp,
    Connecting,
    Running,
    Scanning,
}

/// Handler for messages arriving from the co-processor.
pub struct HostNic {
    events: mpsc::UnboundedSender<HostEvent>,
    assembler: FrameAssembler,
    expected_version: u8,
    mac: Option<MacAddress>,
    firmware_version: Option<u8>,
    link_up: bool,
    seen_packet: bool,
    mode: NicMode,
    /// Mode to return to when a scan ends.
    prescan_mode: NicMode,
}

impl HostNic {
    pub fn new(events: mpsc::UnboundedSender<HostEvent>, config: &HostConfig, max_frame: usize) -> Self {
        Self {
            events,
            assembler: FrameAssembler::new(max_frame),
            expected_version: config.expected_version,
            mac: None,
            firmware_version: None,
            link_up: false,
            seen_packet: false,
            mode: NicMode::WaitInit,
            prescan_mode: NicMode::WaitInit,
        }
    }

    pub fn mac(&self) -> Option<MacAddress> {
        self.mac
    }

    pub fn firmware_version(&self) -> Option<u8> {
        self.firmware_version
    }

    pub fn link_up(&self) -> bool {
        self.link_up
    }

    pub fn mode(&self) -> NicMode {
        self.mode
    }

    /// Returns whether a packet arrived since the last call.
    pub fn take_seen_packet(&mut self) -> bool {
        std::mem::take(&mut self.seen_packet)
    }

    /// Records that credentials were sent.
    pub fn joining(&mut self) {
        if self.mode != NicMode::WrongFirmware {
            self.mode = NicMode::Connecting;
        }
    }

    pub fn scan_started(&mut self) {
        if self.mode != NicMode::Scanning {
            self.prescan_mode = self.mode;
            self.mode = NicMode::Scanning;
        }
    }

    pub fn scan_stopped(&mut self) {
        if self.mode == NicMode::Scanning {
            self.mode = self.prescan_mode;
        }
    }

    fn emit(&self, event: HostEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!("host event receiver gone");
        }
    }

    fn update_link(&mut self, up: bool) {
        if up && self.mode != NicMode::Scanning && self.mode != NicMode::WrongFirmware {
            self.mode = NicMode::Running;
        }
        if up != self.link_up {
            self.link_up = up;
            tracing::info!(up, "link changed");
            self.emit(HostEvent::LinkChanged(up));
        }
    }

    fn verified(message: &Message<'_>) -> bool {
        if let Err(e) = message.verify() {
            tracing::warn!(kind = %message.header.kind, error = %e, "dropping message");
            return false;
        }
        true
    }
}

impl PacketTunnel for HostNic {
    fn begin(&mut self, header: &Header) -> bool {
        if self.assembler.begin(header) {
            return true;
        }
        // Too large to keep, but its link flag still counts.
        tracing::debug!(size = header.payload_size, "dropping oversized frame");
        self.seen_packet = true;
        self.update_link(header.link_up().unwrap_or(false));
        false
    }

    fn update(&mut self, chunk: &[u8]) {
        self.assembler.update(chunk);
    }

    fn commit(&mut self, header: &Header, checksum_valid: bool) {
        let frame = self.assembler.finish(checksum_valid);
        if !checksum_valid {
            return;
        }
        self.seen_packet = true;
        self.update_link(header.link_up().unwrap_or(false));
        if let Some(frame) = frame {
            tracing::trace!(len = frame.len(), "frame received");
            self.emit(HostEvent::Frame(frame));
        }
    }

    fn abandon(&mut self) {
        self.assembler.abandon();
    }
}

impl MessageHandler for HostNic {
    fn on_device_info(&mut self, message: &Message<'_>) {
        if !Self::verified(message) {
            return;
        }
        let mac = match message.mac_address() {
            Ok(mac) => mac,
            Err(e) => {
                tracing::warn!(error = %e, "malformed device info");
                return;
            }
        };
        let version = message.header.variable_byte;
        let supported = version == self.expected_version;

        // Re-sent after every configuration; only the first one sets the mode.
        if self.mode != NicMode::WaitInit {
            tracing::debug!(mode = ?self.mode, "co-processor announced itself again");
        } else if supported {
            tracing::info!(%mac, version, "co-processor ready");
            self.mode = NicMode::NeedAp;
        } else {
            tracing::warn!(
                version,
                expected = self.expected_version,
                "firmware version mismatch"
            );
            self.mode = NicMode::WrongFirmware;
        }
        self.mac = Some(mac);
        self.firmware_version = Some(version);
        self.emit(HostEvent::DeviceInfo {
            mac,
            version,
            supported,
        });
    }

    fn on_link_status(&mut self, message: &Message<'_>) {
        if !Self::verified(message) {
            return;
        }
        let up = message.header.link_up().unwrap_or(false);
        self.seen_packet = true;
        self.update_link(up);
        self.emit(HostEvent::LinkStatus(up));
    }

    fn on_scan_ap_count(&mut self, message: &Message<'_>) {
        if !Self::verified(message) {
            return;
        }
        let count = message.header.variable_byte;
        tracing::debug!(count, "access points found");
        self.emit(HostEvent::ApCount(count));
    }

    fn on_scan_ap_get(&mut self, message: &Message<'_>) {
        if !Self::verified(message) {
            return;
        }
        let index = message.header.variable_byte;
        let info = match message.ap_info() {
            Ok(info) if index != AP_INDEX_OUT_OF_RANGE => info,
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(error = %e, "malformed access point entry");
                return;
            }
        };
        self.emit(HostEvent::ApInfo { index, info });
    }

    fn on_invalid(&mut self, error: &ProtocolError) {
        tracing::debug!(%error, "resynchronizing");
    }
}

/// Keeps the first two bytes of `current` and randomizes the rest.
pub fn rotate_intron(current: &Intron) -> Intron {
    let random = Uuid::new_v4();
    let mut bytes = *current.as_bytes();
    bytes[2..].copy_from_slice(&random.as_bytes()[..INTRON_SIZE - 2]);
    Intron::new(bytes)
}

/// Encodes outbound messages with the host's current intron.
#[derive(Debug, Clone)]
pub struct HostEncoder {
    intron: Intron,
}

impl Default for HostEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl HostEncoder {
    pub fn new() -> Self {
        Self::with_intron(DEFAULT_INTRON)
    }

    pub fn with_intron(intron: Intron) -> Self {
        Self { intron }
    }

    pub fn intron(&self) -> Intron {
        self.intron
    }

    /// Back to the default intron, e.g. after the co-processor reset.
    pub fn reset_intron(&mut self) {
        self.intron = DEFAULT_INTRON;
    }

    /// Credentials plus a fresh intron. The message itself still uses the
    /// current intron; both directions switch to the new one afterwards, so
    /// the caller must hand [`HostEncoder::intron`] to its deframer.
    pub fn join(&mut self, ssid: &[u8], password: &[u8]) -> BytesMut {
        let next = rotate_intron(&self.intron);
        let config = ClientConfig::new(next, ssid, password);
        let encoded = Frame::client_config(&config).encode(&self.intron);
        self.intron = next;
        encoded
    }

    pub fn scan_start(&self) -> BytesMut {
        Frame::scan_start().encode(&self.intron)
    }

    pub fn scan_stop(&self) -> BytesMut {
        Frame::scan_stop().encode(&self.intron)
    }

    pub fn ap_info(&self, index: u8) -> BytesMut {
        Frame::ap_info_request(index).encode(&self.intron)
    }

    /// Zero-length packet; the co-processor answers with its link state.
    pub fn link_poll(&self) -> BytesMut {
        Frame::link_status(false).encode(&self.intron)
    }

    pub fn packet(&self, payload: Bytes) -> Result<BytesMut, ProtocolError> {
        Ok(Frame::packet(false, payload)?.encode(&self.intron))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uartnic_protocol::{Deframer, PRELUDE_SIZE, PROTOCOL_VERSION};

    const MAC: MacAddress = MacAddress([0x08, 0x3A, 0x8D, 0xFA, 0xA7, 0xD3]);

    fn host() -> (Deframer<HostNic>, mpsc::UnboundedReceiver<HostEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Deframer::new(HostNic::new(tx, &HostConfig::default(), 1600)),
            rx,
        )
    }

    fn feed(deframer: &mut Deframer<HostNic>, frames: &[Frame]) {
        for frame in frames {
            deframer.process(&frame.encode(&DEFAULT_INTRON));
        }
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<HostEvent>) -> Vec<HostEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_device_info() {
        let (mut deframer, mut rx) = host();
        feed(&mut deframer, &[Frame::device_info(PROTOCOL_VERSION, MAC)]);
        assert_eq!(
            drain(&mut rx),
            vec![HostEvent::DeviceInfo {
                mac: MAC,
                version: PROTOCOL_VERSION,
                supported: true
            }]
        );
        let nic = deframer.handler();
        assert_eq!(nic.mode(), NicMode::NeedAp);
        assert_eq!(nic.mac(), Some(MAC));
        assert_eq!(nic.firmware_version(), Some(PROTOCOL_VERSION));
    }

    #[test]
    fn test_version_mismatch() {
        let (mut deframer, mut rx) = host();
        feed(&mut deframer, &[Frame::device_info(12, MAC)]);
        assert_eq!(
            drain(&mut rx),
            vec![HostEvent::DeviceInfo {
                mac: MAC,
                version: 12,
                supported: false
            }]
        );
        assert_eq!(deframer.handler().mode(), NicMode::WrongFirmware);
    }

    #[test]
    fn test_link_edges() {
        let (mut deframer, mut rx) = host();
        let payload = Bytes::from_static(&[0xAB; 60]);
        feed(
            &mut deframer,
            &[
                Frame::packet(true, payload.clone()).unwrap(),
                Frame::packet(true, payload.clone()).unwrap(),
                Frame::link_status(false),
            ],
        );
        assert_eq!(
            drain(&mut rx),
            vec![
                HostEvent::LinkChanged(true),
                HostEvent::Frame(payload.clone()),
                HostEvent::Frame(payload),
                HostEvent::LinkChanged(false),
                HostEvent::LinkStatus(false),
            ]
        );
        assert!(deframer.handler_mut().take_seen_packet());
        assert!(!deframer.handler_mut().take_seen_packet());
    }

    #[test]
    fn test_oversized_packet_carries_link_flag() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut deframer = Deframer::new(HostNic::new(tx, &HostConfig::default(), 64));
        let big = Bytes::from(vec![0x11; 200]);
        let small = Bytes::from_static(&[0x22; 32]);
        feed(
            &mut deframer,
            &[
                Frame::packet(true, big).unwrap(),
                Frame::packet(true, small.clone()).unwrap(),
            ],
        );
        assert_eq!(
            drain(&mut rx),
            vec![HostEvent::LinkChanged(true), HostEvent::Frame(small)]
        );
        assert!(deframer.handler().link_up());
    }

    #[test]
    fn test_repeated_device_info_keeps_mode() {
        let (mut deframer, mut rx) = host();
        feed(
            &mut deframer,
            &[
                Frame::device_info(PROTOCOL_VERSION, MAC),
                Frame::link_status(true),
            ],
        );
        deframer.handler_mut().joining();
        feed(&mut deframer, &[Frame::device_info(PROTOCOL_VERSION, MAC)]);
        assert_eq!(drain(&mut rx).len(), 4);
        assert_eq!(deframer.handler().mode(), NicMode::Connecting);
        assert!(deframer.handler().link_up());
    }

    #[test]
    fn test_corrupted_packet_ignored() {
        let (mut deframer, mut rx) = host();
        let mut bytes = Frame::packet(true, Bytes::from_static(&[1; 40]))
            .unwrap()
            .encode(&DEFAULT_INTRON);
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        deframer.process(&bytes);
        assert!(drain(&mut rx).is_empty());
        assert!(!deframer.handler().link_up());
    }

    #[test]
    fn test_scan_answers() {
        let (mut deframer, mut rx) = host();
        let info = ApInfo::new("lab", true);
        feed(
            &mut deframer,
            &[
                Frame::scan_ap_count(3),
                Frame::ap_info_response(1, &info),
                Frame::ap_info_out_of_range(),
            ],
        );
        assert_eq!(
            drain(&mut rx),
            vec![
                HostEvent::ApCount(3),
                HostEvent::ApInfo {
                    index: 1,
                    info: Some(info)
                },
                HostEvent::ApInfo {
                    index: AP_INDEX_OUT_OF_RANGE,
                    info: None
                },
            ]
        );
    }

    #[test]
    fn test_scan_mode_restores() {
        let (mut deframer, _rx) = host();
        feed(&mut deframer, &[Frame::device_info(PROTOCOL_VERSION, MAC)]);
        let nic = deframer.handler_mut();
        nic.scan_started();
        assert_eq!(nic.mode(), NicMode::Scanning);
        nic.scan_stopped();
        assert_eq!(nic.mode(), NicMode::NeedAp);
    }

    #[test]
    fn test_intron_rotation() {
        let old = DEFAULT_INTRON;
        let next = rotate_intron(&old);
        assert_eq!(next.as_bytes()[..2], old.as_bytes()[..2]);
        let other = rotate_intron(&old);
        assert_ne!(next, other);
    }

    #[test]
    fn test_join_switches_intron() {
        let mut encoder = HostEncoder::new();
        let bytes = encoder.join(b"home", b"secret");

        // Sent with the old intron, carrying the new one.
        assert_eq!(&bytes[..INTRON_SIZE], DEFAULT_INTRON.as_bytes());
        let config = ClientConfig::parse(&bytes[PRELUDE_SIZE..]).unwrap();
        assert_eq!(config.intron, encoder.intron());
        assert_eq!(config.ssid, b"home");
        assert_eq!(config.password, b"secret");
        assert_ne!(encoder.intron(), DEFAULT_INTRON);

        let poll = encoder.link_poll();
        assert_eq!(&poll[..INTRON_SIZE], encoder.intron().as_bytes());

        encoder.reset_intron();
        assert_eq!(encoder.intron(), DEFAULT_INTRON);
    }

    #[test]
    fn test_encoder_messages() {
        let encoder = HostEncoder::new();
        assert_eq!(encoder.scan_start().len(), PRELUDE_SIZE);
        assert_eq!(encoder.scan_stop().len(), PRELUDE_SIZE);
        assert_eq!(encoder.ap_info(4)[9], 4);
        let packet = encoder.packet(Bytes::from_static(&[7; 100])).unwrap();
        assert_eq!(packet.len(), PRELUDE_SIZE + 100);
        assert!(encoder.packet(Bytes::from(vec![0; 70_000])).is_err());
    }
}
