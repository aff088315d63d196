use std::io;
use std::net::Ipv4Addr;
use std::time::Duration;

pub(crate) mod raw_socket;

/// Transport used by a [`crate::Pinger`] session: an ICMPv4 socket that hands out whole
/// IPv4 datagrams on receive.
pub trait IcmpSocket: Send {
    fn send_to(&self, buf: &[u8], addr: &socket2::SockAddr) -> io::Result<usize>;

    /// Receives one IPv4 datagram (header included) and the address it came from.
    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, Ipv4Addr)>;

    /// Bounds the next `recv_from`; `None` blocks until a datagram arrives.
    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()>;
}
