mod datagram;
mod echo_request;
mod sequence_number;
pub(crate) mod socket;
mod ttl;

pub use datagram::{Datagram, DecodeError, EchoKey, IcmpMessage, Ipv4Header};
pub use echo_request::EchoRequest;
pub use sequence_number::SequenceNumber;
pub use socket::raw_socket::RawSocket;
pub use socket::IcmpSocket;
pub use ttl::Ttl;

#[cfg(test)]
pub(crate) mod tests {
    use pnet_packet::icmp::destination_unreachable::MutableDestinationUnreachablePacket;
    use pnet_packet::icmp::echo_reply::{EchoReplyPacket, MutableEchoReplyPacket};
    use pnet_packet::icmp::{checksum, IcmpCode, IcmpPacket, IcmpTypes};
    use pnet_packet::ip::IpNextHeaderProtocols;
    use pnet_packet::ipv4::{self, MutableIpv4Packet};
    use pnet_packet::Packet;
    use std::net::Ipv4Addr;

    pub(crate) fn echo_reply_bytes(identifier: u16, sequence: u16, payload: &[u8]) -> Vec<u8> {
        let mut buf = vec![0u8; EchoReplyPacket::minimum_packet_size() + payload.len()];
        let mut package = MutableEchoReplyPacket::new(&mut buf).unwrap();
        package.set_icmp_type(IcmpTypes::EchoReply);
        package.set_icmp_code(IcmpCode::new(0));
        package.set_identifier(identifier);
        package.set_sequence_number(sequence);
        package.set_payload(payload);
        package.set_checksum(0_u16);
        package.set_checksum(checksum(&IcmpPacket::new(package.packet()).unwrap()));
        buf
    }

    /// Destination unreachable message quoting (the start of) `original`.
    pub(crate) fn unreachable_bytes(code: u8, original: &[u8]) -> Vec<u8> {
        let quoted = &original[..original.len().min(28)];
        let mut buf = vec![0u8; MutableDestinationUnreachablePacket::minimum_packet_size() + quoted.len()];
        let mut package = MutableDestinationUnreachablePacket::new(&mut buf).unwrap();
        package.set_icmp_type(IcmpTypes::DestinationUnreachable);
        package.set_icmp_code(IcmpCode::new(code));
        package.set_payload(quoted);
        package.set_checksum(0_u16);
        package.set_checksum(checksum(&IcmpPacket::new(package.packet()).unwrap()));
        buf
    }

    /// Wraps an ICMP message in a 20 byte IPv4 header, as a raw socket hands it out.
    pub(crate) fn ipv4_datagram(source: Ipv4Addr, destination: Ipv4Addr, icmp: &[u8]) -> Vec<u8> {
        let total_length = MutableIpv4Packet::minimum_packet_size() + icmp.len();
        let mut buf = vec![0u8; total_length];
        let mut package = MutableIpv4Packet::new(&mut buf).unwrap();
        package.set_version(4);
        package.set_header_length(5);
        package.set_total_length(u16::try_from(total_length).unwrap());
        package.set_identification(0x1c46);
        package.set_ttl(64);
        package.set_next_level_protocol(IpNextHeaderProtocols::Icmp);
        package.set_source(source);
        package.set_destination(destination);
        package.set_payload(icmp);
        package.set_checksum(ipv4::checksum(&package.to_immutable()));
        buf
    }
}
