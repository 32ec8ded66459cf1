//! Message vocabulary.
//!
//! Every message travels as
//!
//! ```text
//! +---------+------+---------------+--------------+----------+---------+
//! | intron  | kind | variable_byte | payload_size | checksum | payload |
//! | 8 bytes |  1   |       1       |   2 (BE)     |  4 (BE)  |  size   |
//! +---------+------+---------------+--------------+----------+---------+
//! ```
//!
//! The checksum is CRC-32 over intron, header and payload in that order.
//! The meaning of `variable_byte` depends on the kind and is read through
//! the kind-indexed accessors on [`Header`].

use crate::error::ProtocolError;
use crate::MAX_CONTROL_PAYLOAD;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::borrow::Cow;
use std::fmt;

/// Size of the synchronization marker.
pub const INTRON_SIZE: usize = 8;

/// Size of kind + variable byte + payload size.
pub const HEADER_SIZE: usize = 4;

/// Size of the big-endian CRC-32 trailer of the prelude.
pub const CHECKSUM_SIZE: usize = 4;

/// Intron, header and checksum: everything before the payload.
pub const PRELUDE_SIZE: usize = INTRON_SIZE + HEADER_SIZE + CHECKSUM_SIZE;

/// Hardware address length.
pub const MAC_SIZE: usize = 6;

/// Maximum SSID length carried on the wire.
pub const SSID_LEN: usize = 32;

/// Maximum password length carried on the wire.
pub const PASSWORD_LEN: usize = 64;

/// SCAN_AP_GET response payload: SSID followed by the requires-password flag.
pub const AP_INFO_SIZE: usize = SSID_LEN + 1;

/// Index returned in a SCAN_AP_GET response when the request was out of range.
pub const AP_INDEX_OUT_OF_RANGE: u8 = 0xFF;

/// Smallest valid CLIENTCONFIG_V2 payload: intron plus two length bytes.
pub const CLIENT_CONFIG_MIN_SIZE: usize = INTRON_SIZE + 2;

/// Largest CLIENTCONFIG_V2 payload produced by [`ClientConfig::encode`].
pub const CLIENT_CONFIG_MAX_SIZE: usize = CLIENT_CONFIG_MIN_SIZE + SSID_LEN + PASSWORD_LEN;

/// The default synchronization marker: "UN" followed by 0..5.
pub const DEFAULT_INTRON: Intron = Intron([0x55, 0x4E, 0x00, 0x01, 0x02, 0x03, 0x04, 0x05]);

/// 8-byte synchronization marker preceding every message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Intron([u8; INTRON_SIZE]);

impl Intron {
    pub const fn new(bytes: [u8; INTRON_SIZE]) -> Self {
        Self(bytes)
    }

    /// Builds an intron from the first [`INTRON_SIZE`] bytes of `bytes`.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let raw: [u8; INTRON_SIZE] = bytes
            .get(..INTRON_SIZE)
            .and_then(|b| b.try_into().ok())
            .ok_or(ProtocolError::Truncated {
                field: "intron",
                needed: INTRON_SIZE.saturating_sub(bytes.len()),
            })?;
        Ok(Self(raw))
    }

    pub fn as_bytes(&self) -> &[u8; INTRON_SIZE] {
        &self.0
    }
}

impl Default for Intron {
    fn default() -> Self {
        DEFAULT_INTRON
    }
}

impl From<[u8; INTRON_SIZE]> for Intron {
    fn from(bytes: [u8; INTRON_SIZE]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Intron {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

/// Message kind codes. Code 1 belongs to a retired message and is invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageKind {
    DeviceInfoV2 = 0,
    ClientConfigV2 = 6,
    PacketV2 = 7,
    ScanStart = 8,
    ScanStop = 9,
    ScanApCount = 10,
    ScanApGet = 11,
}

impl MessageKind {
    pub fn from_u8(code: u8) -> Option<Self> {
        match code {
            0 => Some(MessageKind::DeviceInfoV2),
            6 => Some(MessageKind::ClientConfigV2),
            7 => Some(MessageKind::PacketV2),
            8 => Some(MessageKind::ScanStart),
            9 => Some(MessageKind::ScanStop),
            10 => Some(MessageKind::ScanApCount),
            11 => Some(MessageKind::ScanApGet),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    /// Checks a declared payload length against the rules for this kind.
    pub fn accepts_len(self, len: u16) -> bool {
        let len = len as usize;
        match self {
            MessageKind::DeviceInfoV2 => len == MAC_SIZE,
            MessageKind::ClientConfigV2 => {
                (CLIENT_CONFIG_MIN_SIZE..=MAX_CONTROL_PAYLOAD).contains(&len)
            }
            MessageKind::PacketV2 => true,
            MessageKind::ScanStart | MessageKind::ScanStop | MessageKind::ScanApCount => len == 0,
            MessageKind::ScanApGet => len == 0 || len == AP_INFO_SIZE,
        }
    }
}

impl TryFrom<u8> for MessageKind {
    type Error = ProtocolError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        MessageKind::from_u8(code).ok_or(ProtocolError::UnknownKind(code))
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MessageKind::DeviceInfoV2 => "DEVICE_INFO_V2",
            MessageKind::ClientConfigV2 => "CLIENTCONFIG_V2",
            MessageKind::PacketV2 => "PACKET_V2",
            MessageKind::ScanStart => "SCAN_START",
            MessageKind::ScanStop => "SCAN_STOP",
            MessageKind::ScanApCount => "SCAN_AP_CNT",
            MessageKind::ScanApGet => "SCAN_AP_GET",
        };
        f.write_str(name)
    }
}

/// Message header: kind, kind-specific byte and payload length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub kind: MessageKind,
    pub variable_byte: u8,
    pub payload_size: u16,
}

impl Header {
    pub fn new(kind: MessageKind, variable_byte: u8, payload_size: u16) -> Self {
        Self {
            kind,
            variable_byte,
            payload_size,
        }
    }

    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let size = self.payload_size.to_be_bytes();
        [self.kind.code(), self.variable_byte, size[0], size[1]]
    }

    /// Decodes and validates a header. Unknown kinds and lengths that the
    /// kind does not allow are rejected.
    pub fn decode(raw: &[u8; HEADER_SIZE]) -> Result<Self, ProtocolError> {
        let kind = MessageKind::try_from(raw[0])?;
        let payload_size = u16::from_be_bytes([raw[2], raw[3]]);
        if !kind.accepts_len(payload_size) {
            return Err(ProtocolError::InvalidLength {
                kind,
                len: payload_size,
            });
        }
        Ok(Self {
            kind,
            variable_byte: raw[1],
            payload_size,
        })
    }

    /// Non-empty packets are streamed through a tunnel; everything else,
    /// including the zero-length link status packet, is buffered.
    pub fn is_streamed(&self) -> bool {
        self.kind == MessageKind::PacketV2 && self.payload_size > 0
    }

    /// Protocol version announced by a DEVICE_INFO_V2.
    pub fn protocol_version(&self) -> Option<u8> {
        (self.kind == MessageKind::DeviceInfoV2).then_some(self.variable_byte)
    }

    /// Link-up flag carried by every PACKET_V2.
    pub fn link_up(&self) -> Option<bool> {
        (self.kind == MessageKind::PacketV2).then_some(self.variable_byte != 0)
    }

    /// Number of discovered access points in a SCAN_AP_CNT.
    pub fn ap_count(&self) -> Option<u8> {
        (self.kind == MessageKind::ScanApCount).then_some(self.variable_byte)
    }

    /// Requested or returned index of a SCAN_AP_GET.
    pub fn ap_index(&self) -> Option<u8> {
        (self.kind == MessageKind::ScanApGet).then_some(self.variable_byte)
    }
}

/// 6-byte hardware address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MacAddress(pub [u8; MAC_SIZE]);

impl MacAddress {
    pub const BROADCAST: MacAddress = MacAddress([0xFF; MAC_SIZE]);

    pub fn from_slice(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let raw: [u8; MAC_SIZE] = bytes
            .get(..MAC_SIZE)
            .and_then(|b| b.try_into().ok())
            .ok_or(ProtocolError::Truncated {
                field: "hardware address",
                needed: MAC_SIZE.saturating_sub(bytes.len()),
            })?;
        Ok(Self(raw))
    }

    /// Group bit of the first octet; broadcast counts as multicast.
    pub fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 != 0
    }

    pub fn as_bytes(&self) -> &[u8; MAC_SIZE] {
        &self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

/// Network credentials and the intron to use from the next message on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub intron: Intron,
    pub ssid: Vec<u8>,
    pub password: Vec<u8>,
}

impl ClientConfig {
    /// Creates a configuration, truncating SSID and password to their wire
    /// limits.
    pub fn new(intron: Intron, ssid: impl AsRef<[u8]>, password: impl AsRef<[u8]>) -> Self {
        let ssid = ssid.as_ref();
        let password = password.as_ref();
        Self {
            intron,
            ssid: ssid[..ssid.len().min(SSID_LEN)].to_vec(),
            password: password[..password.len().min(PASSWORD_LEN)].to_vec(),
        }
    }

    pub fn encode(&self) -> Bytes {
        let ssid = &self.ssid[..self.ssid.len().min(SSID_LEN)];
        let password = &self.password[..self.password.len().min(PASSWORD_LEN)];

        let mut buf = BytesMut::with_capacity(CLIENT_CONFIG_MIN_SIZE + ssid.len() + password.len());
        buf.put_slice(self.intron.as_bytes());
        buf.put_u8(ssid.len() as u8);
        buf.put_slice(ssid);
        buf.put_u8(password.len() as u8);
        buf.put_slice(password);
        buf.freeze()
    }

    /// Parses a CLIENTCONFIG_V2 payload.
    ///
    /// Over-length fields are consumed in full and truncated; bytes after the
    /// password are logged and ignored.
    pub fn parse(payload: &[u8]) -> Result<Self, ProtocolError> {
        let mut buf = payload;
        let intron = Intron::from_slice(buf)?;
        buf.advance(INTRON_SIZE);

        let ssid = take_field(&mut buf, "ssid", SSID_LEN)?;
        let password = take_field(&mut buf, "password", PASSWORD_LEN)?;

        if buf.has_remaining() {
            tracing::warn!(
                trailing = buf.remaining(),
                "client config carries unprocessed trailing bytes"
            );
        }

        Ok(Self {
            intron,
            ssid,
            password,
        })
    }

    pub fn ssid_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.ssid)
    }
}

fn take_field(buf: &mut &[u8], field: &'static str, cap: usize) -> Result<Vec<u8>, ProtocolError> {
    if !buf.has_remaining() {
        return Err(ProtocolError::Truncated { field, needed: 1 });
    }
    let len = buf.get_u8() as usize;
    if buf.remaining() < len {
        return Err(ProtocolError::Truncated {
            field,
            needed: len - buf.remaining(),
        });
    }
    let value = buf[..len.min(cap)].to_vec();
    buf.advance(len);
    Ok(value)
}

/// A discovered access point as reported by SCAN_AP_GET.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApInfo {
    pub ssid: [u8; SSID_LEN],
    pub requires_password: bool,
}

impl ApInfo {
    /// Creates an entry, truncating or zero-padding the SSID to 32 bytes.
    pub fn new(ssid: impl AsRef<[u8]>, requires_password: bool) -> Self {
        let ssid = ssid.as_ref();
        let mut raw = [0u8; SSID_LEN];
        let len = ssid.len().min(SSID_LEN);
        raw[..len].copy_from_slice(&ssid[..len]);
        Self {
            ssid: raw,
            requires_password,
        }
    }

    pub fn encode(&self) -> [u8; AP_INFO_SIZE] {
        let mut raw = [0u8; AP_INFO_SIZE];
        raw[..SSID_LEN].copy_from_slice(&self.ssid);
        raw[SSID_LEN] = self.requires_password as u8;
        raw
    }

    pub fn parse(payload: &[u8]) -> Result<Self, ProtocolError> {
        if payload.len() < AP_INFO_SIZE {
            return Err(ProtocolError::Truncated {
                field: "access point info",
                needed: AP_INFO_SIZE - payload.len(),
            });
        }
        let mut ssid = [0u8; SSID_LEN];
        ssid.copy_from_slice(&payload[..SSID_LEN]);
        Ok(Self {
            ssid,
            requires_password: payload[SSID_LEN] != 0,
        })
    }

    /// SSID bytes up to the first NUL.
    pub fn ssid_bytes(&self) -> &[u8] {
        let end = self.ssid.iter().position(|&b| b == 0).unwrap_or(SSID_LEN);
        &self.ssid[..end]
    }

    pub fn ssid_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.ssid_bytes())
    }
}

impl Default for ApInfo {
    fn default() -> Self {
        Self {
            ssid: [0u8; SSID_LEN],
            requires_password: false,
        }
    }
}

/// A fully received, buffered message as seen by a handler.
///
/// The payload is borrowed from the deframer for the duration of one
/// dispatch. Messages whose checksum failed are still delivered; handlers
/// decide what to do with them.
#[derive(Debug, Clone, Copy)]
pub struct Message<'a> {
    pub header: Header,
    pub payload: &'a [u8],
    pub transmitted_checksum: u32,
    pub computed_checksum: u32,
}

impl<'a> Message<'a> {
    pub fn checksum_valid(&self) -> bool {
        self.transmitted_checksum == self.computed_checksum
    }

    pub fn verify(&self) -> Result<(), ProtocolError> {
        if self.checksum_valid() {
            Ok(())
        } else {
            Err(ProtocolError::ChecksumMismatch {
                expected: self.transmitted_checksum,
                actual: self.computed_checksum,
            })
        }
    }

    /// Hardware address carried by a DEVICE_INFO_V2.
    pub fn mac_address(&self) -> Result<MacAddress, ProtocolError> {
        self.expect_kind(MessageKind::DeviceInfoV2)?;
        MacAddress::from_slice(self.payload)
    }

    pub fn client_config(&self) -> Result<ClientConfig, ProtocolError> {
        self.expect_kind(MessageKind::ClientConfigV2)?;
        ClientConfig::parse(self.payload)
    }

    /// Access point entry of a SCAN_AP_GET response, `None` for a request or
    /// an empty payload.
    pub fn ap_info(&self) -> Result<Option<ApInfo>, ProtocolError> {
        self.expect_kind(MessageKind::ScanApGet)?;
        if self.payload.is_empty() {
            return Ok(None);
        }
        ApInfo::parse(self.payload).map(Some)
    }

    fn expect_kind(&self, kind: MessageKind) -> Result<(), ProtocolError> {
        if self.header.kind == kind {
            Ok(())
        } else {
            Err(ProtocolError::UnexpectedKind(self.header.kind))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_codes() {
        assert_eq!(MessageKind::from_u8(0), Some(MessageKind::DeviceInfoV2));
        assert_eq!(MessageKind::from_u8(11), Some(MessageKind::ScanApGet));
        assert_eq!(MessageKind::from_u8(1), None);
        assert_eq!(MessageKind::from_u8(5), None);
        assert_eq!(MessageKind::from_u8(12), None);
        assert_eq!(MessageKind::ScanApCount.code(), 10);
        assert!(matches!(
            MessageKind::try_from(1),
            Err(ProtocolError::UnknownKind(1))
        ));
    }

    #[test]
    fn test_length_rules() {
        assert!(MessageKind::DeviceInfoV2.accepts_len(6));
        assert!(!MessageKind::DeviceInfoV2.accepts_len(4));
        assert!(!MessageKind::ClientConfigV2.accepts_len(9));
        assert!(MessageKind::ClientConfigV2.accepts_len(10));
        assert!(MessageKind::ClientConfigV2.accepts_len(CLIENT_CONFIG_MAX_SIZE as u16));
        assert!(MessageKind::ClientConfigV2.accepts_len(130));
        assert!(MessageKind::ClientConfigV2.accepts_len(MAX_CONTROL_PAYLOAD as u16));
        assert!(!MessageKind::ClientConfigV2.accepts_len(MAX_CONTROL_PAYLOAD as u16 + 1));
        assert!(MessageKind::PacketV2.accepts_len(0));
        assert!(MessageKind::PacketV2.accepts_len(u16::MAX));
        for kind in [
            MessageKind::ScanStart,
            MessageKind::ScanStop,
            MessageKind::ScanApCount,
        ] {
            assert!(kind.accepts_len(0));
            assert!(!kind.accepts_len(1));
        }
        assert!(MessageKind::ScanApGet.accepts_len(0));
        assert!(MessageKind::ScanApGet.accepts_len(33));
        assert!(!MessageKind::ScanApGet.accepts_len(32));
    }

    #[test]
    fn test_header_encode_decode() {
        let header = Header::new(MessageKind::PacketV2, 1, 0x0102);
        let raw = header.encode();
        assert_eq!(raw, [7, 1, 0x01, 0x02]);
        assert_eq!(Header::decode(&raw).unwrap(), header);
        assert!(header.is_streamed());
        assert!(!Header::new(MessageKind::PacketV2, 1, 0).is_streamed());
        assert!(!Header::new(MessageKind::ScanApGet, 0, 33).is_streamed());
    }

    #[test]
    fn test_header_decode_rejects() {
        assert!(matches!(
            Header::decode(&[1, 0, 0, 0]),
            Err(ProtocolError::UnknownKind(1))
        ));
        assert!(matches!(
            Header::decode(&[0, 13, 0, 4]),
            Err(ProtocolError::InvalidLength {
                kind: MessageKind::DeviceInfoV2,
                len: 4
            })
        ));
        assert!(matches!(
            Header::decode(&[10, 3, 0, 1]),
            Err(ProtocolError::InvalidLength {
                kind: MessageKind::ScanApCount,
                ..
            })
        ));
    }

    #[test]
    fn test_variable_byte_accessors() {
        let info = Header::new(MessageKind::DeviceInfoV2, 13, 6);
        assert_eq!(info.protocol_version(), Some(13));
        assert_eq!(info.link_up(), None);

        let packet = Header::new(MessageKind::PacketV2, 1, 0);
        assert_eq!(packet.link_up(), Some(true));
        assert_eq!(Header::new(MessageKind::PacketV2, 0, 0).link_up(), Some(false));

        assert_eq!(Header::new(MessageKind::ScanApCount, 10, 0).ap_count(), Some(10));
        assert_eq!(Header::new(MessageKind::ScanApGet, 3, 0).ap_index(), Some(3));
        assert_eq!(Header::new(MessageKind::ScanApGet, 3, 0).ap_count(), None);
    }

    #[test]
    fn test_mac_address() {
        let mac = MacAddress([0x08, 0x3A, 0x8D, 0xFA, 0xA7, 0xD3]);
        assert_eq!(mac.to_string(), "08:3a:8d:fa:a7:d3");
        assert!(!mac.is_multicast());
        assert!(MacAddress::BROADCAST.is_multicast());
        assert!(MacAddress([0x01, 0x00, 0x5E, 0, 0, 1]).is_multicast());
        assert!(MacAddress::from_slice(&[1, 2, 3]).is_err());
    }

    #[test]
    fn test_client_config_encode_parse() {
        let config = ClientConfig::new(DEFAULT_INTRON, "home", "secret");
        let encoded = config.encode();
        assert_eq!(encoded.len(), CLIENT_CONFIG_MIN_SIZE + 4 + 6);
        assert_eq!(&encoded[..8], DEFAULT_INTRON.as_bytes());
        assert_eq!(encoded[8], 4);

        let parsed = ClientConfig::parse(&encoded).unwrap();
        assert_eq!(parsed, config);
        assert_eq!(parsed.ssid_str(), "home");
    }

    #[test]
    fn test_client_config_truncation() {
        let long_ssid = vec![b's'; 40];
        let long_pass = vec![b'p'; 80];
        let config = ClientConfig::new(DEFAULT_INTRON, &long_ssid, &long_pass);
        assert_eq!(config.ssid.len(), SSID_LEN);
        assert_eq!(config.password.len(), PASSWORD_LEN);
        assert_eq!(config.encode().len(), CLIENT_CONFIG_MAX_SIZE);

        // An over-length SSID on the wire is consumed in full and truncated.
        let mut raw = DEFAULT_INTRON.as_bytes().to_vec();
        raw.push(40);
        raw.extend_from_slice(&long_ssid);
        raw.push(3);
        raw.extend_from_slice(b"abc");
        let parsed = ClientConfig::parse(&raw).unwrap();
        assert_eq!(parsed.ssid.len(), SSID_LEN);
        assert_eq!(parsed.password, b"abc");
    }

    #[test]
    fn test_client_config_short_payload() {
        let mut raw = DEFAULT_INTRON.as_bytes().to_vec();
        raw.push(5);
        raw.extend_from_slice(b"ab");
        assert!(matches!(
            ClientConfig::parse(&raw),
            Err(ProtocolError::Truncated { field: "ssid", .. })
        ));
        assert!(ClientConfig::parse(&raw[..4]).is_err());
    }

    #[test]
    fn test_client_config_trailing_bytes_ignored() {
        let mut raw = ClientConfig::new(DEFAULT_INTRON, "a", "b").encode().to_vec();
        raw.extend_from_slice(&[0xAA, 0xBB]);
        let parsed = ClientConfig::parse(&raw).unwrap();
        assert_eq!(parsed.ssid, b"a");
        assert_eq!(parsed.password, b"b");
    }

    #[test]
    fn test_ap_info() {
        let info = ApInfo::new("cafe", true);
        let raw = info.encode();
        assert_eq!(&raw[..4], b"cafe");
        assert!(raw[4..SSID_LEN].iter().all(|&b| b == 0));
        assert_eq!(raw[SSID_LEN], 1);

        let parsed = ApInfo::parse(&raw).unwrap();
        assert_eq!(parsed, info);
        assert_eq!(parsed.ssid_str(), "cafe");
        assert!(ApInfo::parse(&raw[..10]).is_err());
        assert_eq!(ApInfo::default().ssid_bytes(), b"");
    }

    #[test]
    fn test_message_accessors() {
        let mac = [0x08, 0x3A, 0x8D, 0xFA, 0xA7, 0xD3];
        let message = Message {
            header: Header::new(MessageKind::DeviceInfoV2, 13, 6),
            payload: &mac,
            transmitted_checksum: 0x5002_3A81,
            computed_checksum: 0x5002_3A81,
        };
        assert!(message.checksum_valid());
        assert!(message.verify().is_ok());
        assert_eq!(message.mac_address().unwrap(), MacAddress(mac));
        assert!(matches!(
            message.client_config(),
            Err(ProtocolError::UnexpectedKind(MessageKind::DeviceInfoV2))
        ));

        let corrupt = Message {
            computed_checksum: 0,
            ..message
        };
        assert!(!corrupt.checksum_valid());
        assert!(matches!(
            corrupt.verify(),
            Err(ProtocolError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_intron() {
        assert_eq!(Intron::default(), DEFAULT_INTRON);
        assert_eq!(&DEFAULT_INTRON.as_bytes()[..2], b"UN");
        assert_eq!(DEFAULT_INTRON.to_string(), "554e000102030405");
        assert!(Intron::from_slice(&[1, 2, 3]).is_err());
    }
}
