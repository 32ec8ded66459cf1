//! Outbound message encoding.
//!
//! A [`Frame`] is a header plus owned payload. It is encoded against the
//! intron in effect at send time, which is why the intron is not part of
//! the frame itself.

use crate::error::ProtocolError;
use crate::message::{
    ApInfo, ClientConfig, Header, Intron, MacAddress, MessageKind, AP_INDEX_OUT_OF_RANGE,
    AP_INFO_SIZE, PRELUDE_SIZE,
};
use crate::MAX_PAYLOAD_SIZE;
use bytes::{BufMut, Bytes, BytesMut};

/// Incremental CRC-32 (IEEE, zlib compatible) over intron, header and
/// payload.
#[derive(Clone, Default)]
pub struct Checksum(crc32fast::Hasher);

impl Checksum {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a checksum with the intron already folded in.
    pub fn seeded(intron: &Intron) -> Self {
        let mut checksum = Self::new();
        checksum.update(intron.as_bytes());
        checksum
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.0.update(bytes);
    }

    /// Current value; the checksum can keep accumulating afterwards.
    pub fn value(&self) -> u32 {
        self.0.clone().finalize()
    }
}

/// Computes the checksum of a complete message.
pub fn checksum(intron: &Intron, header: &Header, payload: &[u8]) -> u32 {
    let mut checksum = Checksum::seeded(intron);
    checksum.update(&header.encode());
    checksum.update(payload);
    checksum.value()
}

/// An outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub header: Header,
    pub payload: Bytes,
}

impl Frame {
    /// Creates a frame whose header length matches the payload.
    pub fn new(kind: MessageKind, variable_byte: u8, payload: Bytes) -> Result<Self, ProtocolError> {
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::PayloadTooLarge {
                size: payload.len(),
                max: MAX_PAYLOAD_SIZE,
            });
        }
        Ok(Self {
            header: Header::new(kind, variable_byte, payload.len() as u16),
            payload,
        })
    }

    fn empty(kind: MessageKind, variable_byte: u8) -> Self {
        Self {
            header: Header::new(kind, variable_byte, 0),
            payload: Bytes::new(),
        }
    }

    pub fn device_info(protocol_version: u8, mac: MacAddress) -> Self {
        Self {
            header: Header::new(MessageKind::DeviceInfoV2, protocol_version, mac.0.len() as u16),
            payload: Bytes::copy_from_slice(mac.as_bytes()),
        }
    }

    pub fn client_config(config: &ClientConfig) -> Self {
        let payload = config.encode();
        Self {
            header: Header::new(MessageKind::ClientConfigV2, 0, payload.len() as u16),
            payload,
        }
    }

    /// A network frame tagged with the sender's view of the link.
    pub fn packet(link_up: bool, payload: Bytes) -> Result<Self, ProtocolError> {
        Self::new(MessageKind::PacketV2, link_up as u8, payload)
    }

    /// Zero-length PACKET_V2: a status query from the primary, a status
    /// report from the co-processor.
    pub fn link_status(link_up: bool) -> Self {
        Self::empty(MessageKind::PacketV2, link_up as u8)
    }

    pub fn scan_start() -> Self {
        Self::empty(MessageKind::ScanStart, 0)
    }

    pub fn scan_stop() -> Self {
        Self::empty(MessageKind::ScanStop, 0)
    }

    pub fn scan_ap_count(count: u8) -> Self {
        Self::empty(MessageKind::ScanApCount, count)
    }

    pub fn ap_info_request(index: u8) -> Self {
        Self::empty(MessageKind::ScanApGet, index)
    }

    pub fn ap_info_response(index: u8, info: &ApInfo) -> Self {
        Self {
            header: Header::new(MessageKind::ScanApGet, index, AP_INFO_SIZE as u16),
            payload: Bytes::copy_from_slice(&info.encode()),
        }
    }

    /// Response to a SCAN_AP_GET whose index has no stored result: the
    /// out-of-range index with an all-zero entry.
    pub fn ap_info_out_of_range() -> Self {
        Self::ap_info_response(AP_INDEX_OUT_OF_RANGE, &ApInfo::default())
    }

    pub fn encoded_len(&self) -> usize {
        PRELUDE_SIZE + self.payload.len()
    }

    /// Encodes the frame behind `intron`. The header is written verbatim.
    pub fn encode(&self, intron: &Intron) -> BytesMut {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode_into(intron, &mut buf);
        buf
    }

    pub fn encode_into(&self, intron: &Intron, buf: &mut BytesMut) {
        let header = self.header.encode();
        buf.reserve(self.encoded_len());

        // Intron (8 bytes)
        buf.put_slice(intron.as_bytes());

        // Kind, variable byte, payload size (4 bytes)
        buf.put_slice(&header);

        // CRC-32 over intron, header, payload (4 bytes)
        buf.put_u32(checksum(intron, &self.header, &self.payload));

        // Payload
        buf.put_slice(&self.payload);
    }
}
