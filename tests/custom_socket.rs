use icmp_echo::icmp::v4::{IcmpMessage, IcmpSocket};
use icmp_echo::{Handlers, Outcome, PingError, Pinger, PingerConfig};
use pnet_packet::icmp::{IcmpPacket, IcmpTypes, MutableIcmpPacket};
use pnet_packet::ip::IpNextHeaderProtocols;
use pnet_packet::ipv4::MutableIpv4Packet;
use pnet_packet::Packet;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Answers every echo request by flipping it into an echo reply from the destination.
#[derive(Clone, Default)]
struct Responder {
    pending: Arc<Mutex<VecDeque<(Vec<u8>, Ipv4Addr)>>>,
    requests: Arc<Mutex<Vec<IcmpMessage>>>,
}

impl IcmpSocket for Responder {
    fn send_to(&self, buf: &[u8], addr: &socket2::SockAddr) -> io::Result<usize> {
        let destination = *addr.as_socket_ipv4().unwrap().ip();
        self.requests.lock().unwrap().push(IcmpMessage::parse(buf).unwrap());

        let mut icmp = buf.to_vec();
        let mut reply = MutableIcmpPacket::new(&mut icmp).unwrap();
        reply.set_icmp_type(IcmpTypes::EchoReply);
        reply.set_checksum(0);
        let checksum = pnet_packet::icmp::checksum(&IcmpPacket::new(reply.packet()).unwrap());
        reply.set_checksum(checksum);

        let mut datagram = vec![0u8; 20 + icmp.len()];
        let mut ip = MutableIpv4Packet::new(&mut datagram).unwrap();
        ip.set_version(4);
        ip.set_header_length(5);
        ip.set_total_length(u16::try_from(20 + icmp.len()).unwrap());
        ip.set_ttl(61);
        ip.set_next_level_protocol(IpNextHeaderProtocols::Icmp);
        ip.set_source(destination);
        ip.set_destination(Ipv4Addr::LOCALHOST);
        ip.set_payload(&icmp);

        self.pending.lock().unwrap().push_back((datagram, destination));
        Ok(buf.len())
    }

    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, Ipv4Addr)> {
        let (datagram, from) =
            self.pending.lock().unwrap().pop_front().ok_or_else(|| io::Error::from(io::ErrorKind::WouldBlock))?;
        buf[..datagram.len()].copy_from_slice(&datagram);
        Ok((datagram.len(), from))
    }

    fn set_read_timeout(&self, _timeout: Option<Duration>) -> io::Result<()> {
        Ok(())
    }
}

fn pinger(responder: &Responder) -> Pinger<Responder> {
    let responder = responder.clone();
    Pinger::with_opener(PingerConfig::default(), move || Ok(responder.clone())).unwrap()
}

#[test]
fn one_outcome_per_attempt() {
    let destination = Ipv4Addr::new(10, 1, 2, 3);
    for count in [0u16, 1, 2, 7] {
        let responder = Responder::default();
        let mut outcomes: Vec<Outcome> = Vec::new();

        pinger(&responder).run(destination, count, &mut outcomes).unwrap();

        assert_eq!(usize::from(count), outcomes.len());
        assert_eq!(usize::from(count), responder.requests.lock().unwrap().len());
        for (sequence, outcome) in (0u16..).zip(&outcomes) {
            match outcome {
                Outcome::Reply(reply) => {
                    assert_eq!(destination, reply.source);
                    assert_eq!(sequence, u16::from(reply.sequence));
                    assert_eq!(61, u8::from(reply.ttl));
                    assert_eq!(12, reply.icmp_size);
                }
                other => panic!("unexpected outcome {other:?}"),
            }
        }
    }
}

#[test]
fn requests_carry_process_identifier_and_payload() {
    let responder = Responder::default();
    let mut pinger = pinger(&responder);
    let identifier = pinger.config().identifier;

    pinger.run(Ipv4Addr::LOCALHOST, 2, &mut Vec::<Outcome>::new()).unwrap();

    for request in responder.requests.lock().unwrap().iter() {
        assert!(matches!(
            request,
            IcmpMessage::EchoRequest { identifier: id, payload, .. } if *id == identifier && payload == b"ping"
        ));
    }
}

#[test]
fn handlers_receive_replies() {
    let responder = Responder::default();
    let lines = RefCell::new(Vec::new());
    {
        let mut handlers = Handlers::new()
            .reply(|reply| {
                let line = format!("{} bytes from {}: icmp_seq={}", reply.icmp_size, reply.source, reply.sequence);
                lines.borrow_mut().push(line);
            })
            .error(|e| lines.borrow_mut().push(format!("error {e}")));
        pinger(&responder).run(Ipv4Addr::LOCALHOST, 2, &mut handlers).unwrap();
    }

    assert_eq!(
        vec!["12 bytes from 127.0.0.1: icmp_seq=0", "12 bytes from 127.0.0.1: icmp_seq=1"],
        lines.into_inner()
    );
}

#[test]
fn denied_privilege_aborts_before_any_attempt() {
    let mut pinger = Pinger::<Responder>::with_opener(PingerConfig::default(), || {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "Operation not permitted"))
    })
    .unwrap();
    let mut outcomes: Vec<Outcome> = Vec::new();

    let result = pinger.run(Ipv4Addr::LOCALHOST, 3, &mut outcomes);

    assert!(matches!(result, Err(PingError::Open(_))));
    assert!(outcomes.is_empty());
}
