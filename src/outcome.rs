use crate::icmp::v4::{Datagram, DecodeError, IcmpMessage, SequenceNumber, Ttl};
use std::error::Error;
use std::fmt;
use std::io;
use std::net::Ipv4Addr;
use std::time::Duration;

/// Reply to an echo request, with the fields of the IPv4 header it arrived in.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EchoReply {
    pub identifier: u16,
    pub sequence: SequenceNumber,
    pub source: Ipv4Addr,
    pub ttl: Ttl,
    pub ip_version: u8,
    /// IPv4 total length in bytes.
    pub total_length: u16,
    pub header_id: u16,
    pub type_of_service: u8,
    /// ICMP message size in bytes, header included.
    pub icmp_size: usize,
    pub round_trip: Duration,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Unreachable {
    /// Host or router that reported the destination unreachable.
    pub source: Ipv4Addr,
    pub code: u8,
}

/// Why an attempt produced neither a reply nor an unreachable notice.
#[derive(Debug)]
pub enum AttemptError {
    Timeout,
    Decode(DecodeError),
    UnexpectedType { icmp_type: u8, code: u8 },
    Send(io::Error),
    Receive(io::Error),
}

impl fmt::Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptError::Timeout => write!(f, "timed out waiting for reply"),
            AttemptError::Decode(e) => write!(f, "could not decode reply: {e}"),
            AttemptError::UnexpectedType { icmp_type, code } => {
                write!(f, "unexpected ICMP message type {icmp_type} code {code}")
            }
            AttemptError::Send(e) => write!(f, "send failed: {e}"),
            AttemptError::Receive(e) => write!(f, "receive failed: {e}"),
        }
    }
}

impl Error for AttemptError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AttemptError::Decode(e) => Some(e),
            AttemptError::Send(e) | AttemptError::Receive(e) => Some(e),
            AttemptError::Timeout | AttemptError::UnexpectedType { .. } => None,
        }
    }
}

/// Result of one attempt; exactly one is produced per echo request sent.
#[derive(Debug)]
pub enum Outcome {
    Reply(EchoReply),
    Unreachable(Unreachable),
    TransportError(AttemptError),
}

impl Outcome {
    /// Classifies a raw datagram as received from the socket.
    #[must_use]
    pub fn classify(bytes: &[u8]) -> Outcome {
        match Datagram::parse(bytes) {
            Ok(datagram) => Outcome::from_datagram(datagram),
            Err(e) => Outcome::TransportError(AttemptError::Decode(e)),
        }
    }

    #[must_use]
    pub fn from_datagram(datagram: Datagram) -> Outcome {
        let Datagram { header, message, icmp_size } = datagram;
        match message {
            IcmpMessage::EchoReply { identifier, sequence, .. } => Outcome::Reply(EchoReply {
                identifier,
                sequence,
                source: header.source,
                ttl: header.ttl,
                ip_version: header.version,
                total_length: header.total_length,
                header_id: header.identification,
                type_of_service: header.type_of_service,
                icmp_size,
                round_trip: Duration::ZERO,
            }),
            IcmpMessage::DestinationUnreachable { code, .. } => {
                Outcome::Unreachable(Unreachable { source: header.source, code })
            }
            other => Outcome::TransportError(AttemptError::UnexpectedType {
                icmp_type: other.icmp_type(),
                code: other.code(),
            }),
        }
    }
}
