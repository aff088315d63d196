use super::SequenceNumber;
use pnet_packet::icmp::echo_request::{EchoRequestPacket, MutableEchoRequestPacket};
use pnet_packet::icmp::{IcmpCode, IcmpPacket, IcmpTypes};
use pnet_packet::Packet;

/// An ICMP echo request as it is put on the wire, one per attempt.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EchoRequest {
    identifier: u16,
    sequence: SequenceNumber,
    payload: Vec<u8>,
}

impl EchoRequest {
    #[must_use]
    pub fn new(identifier: u16, sequence: SequenceNumber, payload: &[u8]) -> Self {
        EchoRequest { identifier, sequence, payload: payload.to_vec() }
    }

    #[must_use]
    pub fn identifier(&self) -> u16 {
        self.identifier
    }

    #[must_use]
    pub fn sequence(&self) -> SequenceNumber {
        self.sequence
    }

    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Serializes the request (type 8, code 0) including its checksum.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = vec![0u8; EchoRequestPacket::minimum_packet_size() + self.payload.len()];
        let mut packet = MutableEchoRequestPacket::new(&mut buf).expect("logic error: buffer sized for echo request");
        packet.set_icmp_type(IcmpTypes::EchoRequest);
        packet.set_icmp_code(IcmpCode::new(0));
        packet.set_identifier(self.identifier);
        packet.set_sequence_number(self.sequence.into());
        packet.set_payload(&self.payload);

        packet.set_checksum(0_u16);
        let checksum = IcmpPacket::new(packet.packet()).map_or(0, |icmp| pnet_packet::icmp::checksum(&icmp));
        packet.set_checksum(checksum);
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icmp::v4::{DecodeError, IcmpMessage};

    #[test]
    fn encode_sets_header_fields() {
        let request = EchoRequest::new(0x1234, SequenceNumber::from(7), b"ping");
        let bytes = request.encode();

        assert_eq!(12, bytes.len());
        assert_eq!(8, bytes[0]);
        assert_eq!(0, bytes[1]);
        assert_eq!(&[0x12u8, 0x34], &bytes[4..6]);
        assert_eq!(&[0x00u8, 0x07], &bytes[6..8]);
        assert_eq!(b"ping", &bytes[8..]);
    }

    #[test]
    fn encoded_request_parses_back() {
        let request = EchoRequest::new(0xBEEF, SequenceNumber::from(42), b"some payload");

        let message = IcmpMessage::parse(&request.encode()).unwrap();

        match message {
            IcmpMessage::EchoRequest { code, identifier, sequence, payload } => {
                assert_eq!(0, code);
                assert_eq!(request.identifier(), identifier);
                assert_eq!(request.sequence(), sequence);
                assert_eq!(request.payload(), &payload[..]);
            }
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn encoded_request_with_empty_payload_parses_back() {
        let request = EchoRequest::new(1, SequenceNumber::start_value(), &[]);

        let message = IcmpMessage::parse(&request.encode()).unwrap();

        assert!(matches!(message, IcmpMessage::EchoRequest { identifier: 1, payload, .. } if payload.is_empty()));
    }

    #[test]
    fn corrupted_request_fails_checksum() {
        let mut bytes = EchoRequest::new(1, SequenceNumber::from(1), b"ping").encode();
        bytes[9] ^= 0xFF;

        assert!(matches!(IcmpMessage::parse(&bytes), Err(DecodeError::Checksum { .. })));
    }
}
