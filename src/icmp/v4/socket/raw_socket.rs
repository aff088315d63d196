use super::IcmpSocket;
use socket2::{Domain, Protocol, Type};
use std::net::{Ipv4Addr, SocketAddr};
use std::{io, time::Duration};

// socket2 turns a zero timeout into "block forever".
const MIN_READ_TIMEOUT: Duration = Duration::from_millis(1);

/// Raw ICMPv4 socket listening on all local IPv4 interfaces. Needs root or `CAP_NET_RAW`.
///
/// The socket is closed when the value is dropped.
pub struct RawSocket {
    socket: socket2::Socket,
}

impl RawSocket {
    pub fn open() -> Result<Self, io::Error> {
        tracing::trace!("creating RawSocket");
        let socket = socket2::Socket::new(Domain::IPV4, Type::RAW, Some(Protocol::ICMPV4))?;
        socket.bind(&SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)).into())?;
        Ok(RawSocket { socket })
    }
}

impl IcmpSocket for RawSocket {
    fn send_to(&self, buf: &[u8], addr: &socket2::SockAddr) -> io::Result<usize> {
        self.socket.send_to(buf, addr)
    }

    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, Ipv4Addr)> {
        // Socket2 guarantees it never writes uninitialized bytes into the buffer, which makes
        // the cast from `&mut [u8]` to `&mut [MaybeUninit<u8>]` sound.
        // https://docs.rs/socket2/0.4.7/socket2/struct.Socket.html#method.recv
        //
        // On a RAW socket we get the IP packet, header included.
        let (size, socket_addr) = self
            .socket
            .recv_from(unsafe { &mut *(buf as *mut [u8] as *mut [std::mem::MaybeUninit<u8>]) })?;
        let source = socket_addr
            .as_socket_ipv4()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "received from a non-IPv4 address"))?;
        Ok((size, *source.ip()))
    }

    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.socket.set_read_timeout(timeout.map(|t| t.max(MIN_READ_TIMEOUT)))
    }
}
