//! ICMP echo ("ping") client for IPv4 over a raw socket.
//!
//! A [`Pinger`] sends a numbered echo request per attempt, waits for the answer and reports
//! exactly one [`Outcome`] per attempt to an [`OutcomeSink`]: a reply, a destination
//! unreachable notice, or an [`AttemptError`].
#![warn(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

pub use icmp::v4::{IcmpSocket, RawSocket, SequenceNumber, Ttl};
pub use outcome::{AttemptError, EchoReply, Outcome, Unreachable};
pub use outcome_sink::{Handlers, OutcomeSink};
pub use ping_error::{PingError, PingResult};
pub use pinger::{Pinger, PingerConfig, ReplyMatching, DEFAULT_TIMEOUT, MAX_PAYLOAD_SIZE};

pub mod icmp;
mod outcome;
mod outcome_sink;
mod ping_error;
mod pinger;
