use super::{SequenceNumber, Ttl};
use pnet_packet::icmp::echo_reply::EchoReplyPacket;
use pnet_packet::icmp::echo_request::EchoRequestPacket;
use pnet_packet::icmp::{IcmpPacket, IcmpType, IcmpTypes};
use pnet_packet::ipv4::Ipv4Packet;
use pnet_packet::Packet;
use std::error::Error;
use std::fmt;
use std::net::Ipv4Addr;

const ICMP_HEADER_SIZE: usize = 8;

// Types assigned for ICMPv4 in RFC 792 and still in use.
const KNOWN_ICMP_TYPES: [u8; 11] = [0, 3, 4, 5, 8, 9, 10, 11, 12, 13, 14];

// Error messages that carry the IP header and first 8 bytes of the offending datagram.
const QUOTING_ICMP_TYPES: [u8; 5] = [3, 4, 5, 11, 12];

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DecodeError {
    Truncated { needed: usize, available: usize },
    NotIpv4(u8),
    BadHeaderLength(u8),
    Checksum { expected: u16, actual: u16 },
    UnknownType(u8),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Truncated { needed, available } => {
                write!(f, "datagram truncated: need {needed} bytes, got {available}")
            }
            DecodeError::NotIpv4(version) => write!(f, "IP version {version} is not 4"),
            DecodeError::BadHeaderLength(ihl) => write!(f, "invalid IPv4 header length {ihl}"),
            DecodeError::Checksum { expected, actual } => {
                write!(f, "ICMP checksum mismatch: expected {expected:#06x}, got {actual:#06x}")
            }
            DecodeError::UnknownType(icmp_type) => write!(f, "unknown ICMP type {icmp_type}"),
        }
    }
}

impl Error for DecodeError {}

/// One outstanding echo request: where it went, its identifier and its sequence number.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct EchoKey {
    pub destination: Ipv4Addr,
    pub identifier: u16,
    pub sequence: SequenceNumber,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Ipv4Header {
    pub version: u8,
    /// Header length in bytes.
    pub header_length: usize,
    pub type_of_service: u8,
    pub total_length: u16,
    pub identification: u16,
    pub ttl: Ttl,
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
}

impl Ipv4Header {
    /// Parses the leading IPv4 header of `bytes` and returns it together with the length
    /// of the datagram it describes, clamped to the bytes actually available.
    fn parse(bytes: &[u8]) -> Result<(Ipv4Header, usize), DecodeError> {
        let packet = Ipv4Packet::new(bytes).ok_or(DecodeError::Truncated {
            needed: Ipv4Packet::minimum_packet_size(),
            available: bytes.len(),
        })?;
        let version = packet.get_version();
        if version != 4 {
            return Err(DecodeError::NotIpv4(version));
        }
        let ihl = packet.get_header_length();
        let header_length = usize::from(ihl) * 4;
        if header_length < Ipv4Packet::minimum_packet_size() {
            return Err(DecodeError::BadHeaderLength(ihl));
        }
        if header_length > bytes.len() {
            return Err(DecodeError::Truncated { needed: header_length, available: bytes.len() });
        }

        let total_length = packet.get_total_length();
        // Some stacks hand out a zero or short total length; trust the buffer then.
        let datagram_length = match usize::from(total_length) {
            len if len >= header_length => len.min(bytes.len()),
            _ => bytes.len(),
        };

        let header = Ipv4Header {
            version,
            header_length,
            type_of_service: (packet.get_dscp() << 2) | packet.get_ecn(),
            total_length,
            identification: packet.get_identification(),
            ttl: packet.get_ttl().into(),
            source: packet.get_source(),
            destination: packet.get_destination(),
        };
        Ok((header, datagram_length))
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum IcmpMessage {
    EchoReply { code: u8, identifier: u16, sequence: SequenceNumber, payload: Vec<u8> },
    EchoRequest { code: u8, identifier: u16, sequence: SequenceNumber, payload: Vec<u8> },
    DestinationUnreachable { code: u8, quoted: Option<EchoKey> },
    TimeExceeded { code: u8, quoted: Option<EchoKey> },
    Other { icmp_type: u8, code: u8, quoted: Option<EchoKey> },
}

impl IcmpMessage {
    /// Parses an ICMP message without the surrounding IP header.
    pub fn parse(bytes: &[u8]) -> Result<IcmpMessage, DecodeError> {
        if bytes.len() < ICMP_HEADER_SIZE {
            return Err(DecodeError::Truncated { needed: ICMP_HEADER_SIZE, available: bytes.len() });
        }
        let packet = IcmpPacket::new(bytes)
            .ok_or(DecodeError::Truncated { needed: ICMP_HEADER_SIZE, available: bytes.len() })?;

        let icmp_type = packet.get_icmp_type();
        if !KNOWN_ICMP_TYPES.contains(&icmp_type.0) {
            return Err(DecodeError::UnknownType(icmp_type.0));
        }
        let expected = pnet_packet::icmp::checksum(&packet);
        let actual = packet.get_checksum();
        if expected != actual {
            return Err(DecodeError::Checksum { expected, actual });
        }

        let code = packet.get_icmp_code().0;
        let quoted = if QUOTING_ICMP_TYPES.contains(&icmp_type.0) { quoted_echo_request(bytes) } else { None };
        let message = match icmp_type {
            IcmpTypes::EchoReply => {
                let echo = EchoReplyPacket::new(bytes)
                    .ok_or(DecodeError::Truncated { needed: ICMP_HEADER_SIZE, available: bytes.len() })?;
                IcmpMessage::EchoReply {
                    code,
                    identifier: echo.get_identifier(),
                    sequence: echo.get_sequence_number().into(),
                    payload: echo.payload().to_vec(),
                }
            }
            IcmpTypes::EchoRequest => {
                let echo = EchoRequestPacket::new(bytes)
                    .ok_or(DecodeError::Truncated { needed: ICMP_HEADER_SIZE, available: bytes.len() })?;
                IcmpMessage::EchoRequest {
                    code,
                    identifier: echo.get_identifier(),
                    sequence: echo.get_sequence_number().into(),
                    payload: echo.payload().to_vec(),
                }
            }
            IcmpTypes::DestinationUnreachable => IcmpMessage::DestinationUnreachable { code, quoted },
            IcmpTypes::TimeExceeded => IcmpMessage::TimeExceeded { code, quoted },
            IcmpType(other) => IcmpMessage::Other { icmp_type: other, code, quoted },
        };
        Ok(message)
    }

    #[must_use]
    pub fn icmp_type(&self) -> u8 {
        match self {
            IcmpMessage::EchoReply { .. } => IcmpTypes::EchoReply.0,
            IcmpMessage::EchoRequest { .. } => IcmpTypes::EchoRequest.0,
            IcmpMessage::DestinationUnreachable { .. } => IcmpTypes::DestinationUnreachable.0,
            IcmpMessage::TimeExceeded { .. } => IcmpTypes::TimeExceeded.0,
            IcmpMessage::Other { icmp_type, .. } => *icmp_type,
        }
    }

    #[must_use]
    pub fn code(&self) -> u8 {
        match self {
            IcmpMessage::EchoReply { code, .. }
            | IcmpMessage::EchoRequest { code, .. }
            | IcmpMessage::DestinationUnreachable { code, .. }
            | IcmpMessage::TimeExceeded { code, .. }
            | IcmpMessage::Other { code, .. } => *code,
        }
    }
}

// Layout after the 8 byte error header: original IPv4 header, then the first 8 bytes of the
// original ICMP message. The key's destination is the one the original datagram was sent to.
fn quoted_echo_request(bytes: &[u8]) -> Option<EchoKey> {
    let original = bytes.get(ICMP_HEADER_SIZE..)?;
    let ip = Ipv4Packet::new(original)?;
    let header_length = usize::from(ip.get_header_length()) * 4;
    if header_length < Ipv4Packet::minimum_packet_size() {
        return None;
    }
    let request = EchoRequestPacket::new(original.get(header_length..)?)?;
    if request.get_icmp_type() != IcmpTypes::EchoRequest {
        return None;
    }
    Some(EchoKey {
        destination: ip.get_destination(),
        identifier: request.get_identifier(),
        sequence: request.get_sequence_number().into(),
    })
}

/// A received IPv4 datagram carrying an ICMP message.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Datagram {
    pub header: Ipv4Header,
    pub message: IcmpMessage,
    /// Length of the ICMP message in bytes, header included.
    pub icmp_size: usize,
}

impl Datagram {
    pub fn parse(bytes: &[u8]) -> Result<Datagram, DecodeError> {
        let (header, datagram_length) = Ipv4Header::parse(bytes)?;
        let icmp = &bytes[header.header_length..datagram_length];
        let message = IcmpMessage::parse(icmp)?;
        Ok(Datagram { header, message, icmp_size: icmp.len() })
    }

    /// Whether this datagram answers the outstanding request `key`: an echo reply from the
    /// request's destination with its identifier and sequence number, or an error message
    /// quoting exactly that request.
    #[must_use]
    pub fn answers(&self, key: EchoKey) -> bool {
        match &self.message {
            IcmpMessage::EchoReply { identifier, sequence, .. } => {
                self.header.source == key.destination
                    && *identifier == key.identifier
                    && *sequence == key.sequence
            }
            IcmpMessage::EchoRequest { .. } => false,
            IcmpMessage::DestinationUnreachable { quoted, .. }
            | IcmpMessage::TimeExceeded { quoted, .. }
            | IcmpMessage::Other { quoted, .. } => *quoted == Some(key),
        }
    }
}
