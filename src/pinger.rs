use crate::icmp::v4::{Datagram, EchoKey, EchoRequest, IcmpSocket, RawSocket, SequenceNumber};
use crate::{AttemptError, Outcome, OutcomeSink, PingError, PingResult};
use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};

// One Ethernet frame; anything larger arrives fragmented and is of no interest here.
const RECV_BUFFER_SIZE: usize = 1500;

// Largest payload that fits one frame next to the IPv4 and ICMP headers.
pub const MAX_PAYLOAD_SIZE: usize = RECV_BUFFER_SIZE - 20 - 8;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Which received datagram counts as the answer to an echo request.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ReplyMatching {
    /// Only an echo reply from the destination with the request's identifier and sequence
    /// number, or an ICMP error quoting the request sent to that destination. Everything else is skipped until the timeout expires.
    #[default]
    Correlated,
    /// The first datagram received after sending, whatever it is.
    FirstDatagram,
}

#[allow(clippy::module_name_repetitions)]
#[derive(Clone, Debug)]
pub struct PingerConfig {
    /// Upper bound for each attempt's wait; `None` waits forever.
    pub timeout: Option<Duration>,
    /// ICMP identifier shared by every request of the pinger.
    pub identifier: u16,
    pub payload: Vec<u8>,
    pub matching: ReplyMatching,
}

impl Default for PingerConfig {
    fn default() -> Self {
        PingerConfig {
            timeout: Some(DEFAULT_TIMEOUT),
            identifier: process_identifier(),
            payload: b"ping".to_vec(),
            matching: ReplyMatching::default(),
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn process_identifier() -> u16 {
    (std::process::id() & 0xFFFF) as u16
}

type SocketOpener<S> = Box<dyn FnMut() -> io::Result<S> + Send>;

/// Sends echo requests to one destination at a time and reports one [`Outcome`] per request.
///
/// ```no_run
/// use icmp_echo::{Handlers, Pinger, PingerConfig};
/// use std::net::Ipv4Addr;
///
/// let mut pinger = Pinger::new(PingerConfig::default())?;
/// let mut handlers = Handlers::new()
///     .reply(|reply| println!("reply from {} ttl={}", reply.source, reply.ttl))
///     .unreachable(|_| println!("destination unreachable"))
///     .error(|e| println!("error: {e}"));
/// pinger.run(Ipv4Addr::LOCALHOST, 3, &mut handlers)?;
/// # Ok::<(), icmp_echo::PingError>(())
/// ```
pub struct Pinger<S = RawSocket> {
    config: PingerConfig,
    open_socket: SocketOpener<S>,
}

impl Pinger<RawSocket> {
    /// Creates a pinger on a raw socket. The socket is only opened once [`Pinger::run`] has
    /// an attempt to make.
    pub fn new(config: PingerConfig) -> PingResult<Self> {
        Self::with_opener(config, RawSocket::open)
    }
}

impl<S> Pinger<S>
where
    S: IcmpSocket + 'static,
{
    /// Creates a pinger whose sessions get their transport from `open_socket`.
    pub fn with_opener<F>(config: PingerConfig, open_socket: F) -> PingResult<Self>
    where
        F: FnMut() -> io::Result<S> + Send + 'static,
    {
        if config.payload.len() > MAX_PAYLOAD_SIZE {
            return Err(PingError::InvalidConfig(format!(
                "payload of {} bytes exceeds the maximum of {MAX_PAYLOAD_SIZE}",
                config.payload.len()
            )));
        }
        Ok(Pinger { config, open_socket: Box::new(open_socket) })
    }

    #[must_use]
    pub fn config(&self) -> &PingerConfig {
        &self.config
    }

    /// Makes `count` attempts against `destination`, handing each outcome to `sink` before
    /// the next attempt starts.
    ///
    /// Unanswered, unreachable and failed attempts do not stop the run. The only error is a
    /// socket that cannot be opened, in which case no attempt is made.
    pub fn run<O>(&mut self, destination: Ipv4Addr, count: u16, sink: &mut O) -> PingResult<()>
    where
        O: OutcomeSink + ?Sized,
    {
        if count == 0 {
            tracing::debug!(%destination, "nothing to send");
            return Ok(());
        }
        let socket = (self.open_socket)().map_err(|e| {
            tracing::error!("could not open ICMP socket: {e}");
            PingError::Open(e)
        })?;
        let session = Session { config: &self.config, destination, total_attempts: count, socket };
        session.run(sink);
        Ok(())
    }
}

/// State of a single run; dropping it closes the socket.
struct Session<'a, S> {
    config: &'a PingerConfig,
    destination: Ipv4Addr,
    total_attempts: u16,
    socket: S,
}

impl<S> Session<'_, S>
where
    S: IcmpSocket,
{
    fn run<O>(self, sink: &mut O)
    where
        O: OutcomeSink + ?Sized,
    {
        tracing::debug!(destination = %self.destination, attempts = self.total_attempts, "session started");
        let mut sequence = SequenceNumber::start_value();
        for _ in 0..self.total_attempts {
            let outcome = self.attempt(sequence);
            sink.on_outcome(outcome);
            sequence = sequence.next();
        }
        tracing::debug!(destination = %self.destination, "session done");
    }

    fn attempt(&self, sequence: SequenceNumber) -> Outcome {
        let request = EchoRequest::new(self.config.identifier, sequence, &self.config.payload);
        let key = EchoKey { destination: self.destination, identifier: request.identifier(), sequence };

        let addr: socket2::SockAddr = SocketAddr::from((self.destination, 0)).into();
        let sent_at = Instant::now();
        if let Err(e) = self.socket.send_to(&request.encode(), &addr) {
            tracing::warn!(%sequence, "could not send echo request: {e}");
            return Outcome::TransportError(AttemptError::Send(e));
        }
        tracing::trace!(destination = %self.destination, %sequence, "echo request sent");

        match self.await_reply(key, sent_at) {
            Outcome::Reply(mut reply) => {
                reply.round_trip = sent_at.elapsed();
                Outcome::Reply(reply)
            }
            other => other,
        }
    }

    fn await_reply(&self, key: EchoKey, sent_at: Instant) -> Outcome {
        let deadline = self.config.timeout.map(|timeout| sent_at + timeout);
        let mut buf = [0u8; RECV_BUFFER_SIZE];
        loop {
            let remaining = match deadline {
                None => None,
                Some(deadline) => match deadline.checked_duration_since(Instant::now()) {
                    Some(remaining) if !remaining.is_zero() => Some(remaining),
                    _ => return Outcome::TransportError(AttemptError::Timeout),
                },
            };
            if let Err(e) = self.socket.set_read_timeout(remaining) {
                return Outcome::TransportError(AttemptError::Receive(e));
            }

            let (size, from) = match self.socket.recv_from(&mut buf) {
                Ok(received) => received,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                    tracing::trace!(sequence = %key.sequence, "timed out");
                    return Outcome::TransportError(AttemptError::Timeout);
                }
                Err(e) => {
                    tracing::warn!(sequence = %key.sequence, "could not receive: {e}");
                    return Outcome::TransportError(AttemptError::Receive(e));
                }
            };
            tracing::trace!(%from, size, "datagram received");

            let bytes = &buf[..size];
            match self.config.matching {
                ReplyMatching::FirstDatagram => return Outcome::classify(bytes),
                ReplyMatching::Correlated => match Datagram::parse(bytes) {
                    Ok(datagram) if datagram.answers(key) => return Outcome::from_datagram(datagram),
                    Ok(datagram) => {
                        tracing::debug!(%from, icmp_type = datagram.message.icmp_type(), "skipping unrelated datagram");
                    }
                    Err(e) => tracing::debug!(%from, "skipping undecodable datagram: {e}"),
                },
            }
        }
    }
}
