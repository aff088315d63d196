use icmp_echo::{Handlers, Pinger, PingerConfig, ReplyMatching};
use std::net::Ipv4Addr;
use std::time::Duration;

type GenericError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(argh::FromArgs)]
/// ping - send ICMP ECHO_REQUEST to an IPv4 address (needs root or CAP_NET_RAW)
struct Args {
    #[argh(positional)]
    /// IPv4 address
    address: Ipv4Addr,

    #[argh(option, short = 'c', default = "1")]
    /// number of echo requests to send
    count: u16,

    #[argh(option, short = 'W', default = "1")]
    /// seconds to wait for each reply, 0 waits forever
    timeout: u64,

    #[argh(switch)]
    /// take the first datagram received as the answer, even if it belongs to someone else
    first_datagram: bool,

    #[argh(switch, short = 'v')]
    /// log what the session does
    verbose: bool,
}

fn main() -> Result<(), GenericError> {
    let args: Args = argh::from_env();

    let level = if args.verbose { tracing::Level::TRACE } else { tracing::Level::WARN };
    let subscriber = tracing_subscriber::FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let config = PingerConfig {
        timeout: (args.timeout > 0).then(|| Duration::from_secs(args.timeout)),
        matching: if args.first_datagram { ReplyMatching::FirstDatagram } else { ReplyMatching::Correlated },
        ..PingerConfig::default()
    };
    let mut pinger = Pinger::new(config)?;

    let mut handlers = Handlers::new()
        .reply(|reply| {
            println!(
                "{} bytes from {}: icmp_seq={} ttl={} ver={} id={} tos={} time={:?}",
                reply.icmp_size,
                reply.source,
                reply.sequence,
                reply.ttl,
                reply.ip_version,
                reply.header_id,
                reply.type_of_service,
                reply.round_trip,
            );
        })
        .unreachable(|unreachable| {
            println!("from {}: destination unreachable (code {})", unreachable.source, unreachable.code);
        })
        .error(|e| println!("error ping: {e}"));

    println!("PING {}", args.address);
    if let Err(e) = pinger.run(args.address, args.count, &mut handlers) {
        if e.is_permission_denied() {
            eprintln!("raw sockets need root or CAP_NET_RAW");
        }
        return Err(e.into());
    }
    Ok(())
}
