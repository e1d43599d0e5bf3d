//! Service discovery example.
//!
//! Hunts for a service type on the local network and prints every
//! address it discovers.
//!
//! ```
//! cargo run --package elights-mdns --example discover -- --service _elg._tcp.local
//! ```

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};

use bytes::BytesMut;
use clap::Parser;
use elights_mdns::{
    Discovery, DiscoveryConfig, DiscoveryEvent, MAX_DATAGRAM_SIZE, MulticastSocket,
};
use sansio::Protocol;
use shared::{TaggedBytesMut, TransportContext, TransportProtocol};
use tokio::net::UdpSocket;

#[derive(Parser, Debug)]
#[command(name = "discover")]
#[command(about = "Discover a service type via mDNS")]
struct Args {
    /// Service type to hunt for
    #[arg(long, default_value = "_elg._tcp.local")]
    service: String,

    /// Query interval in seconds
    #[arg(long, default_value = "5")]
    interval: u64,

    /// How long to run before exiting, in seconds
    #[arg(long, default_value = "60")]
    duration: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let std_socket = MulticastSocket::new().into_std()?;
    let socket = UdpSocket::from_std(std_socket)?;
    let bind_addr: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 5353);

    let config = DiscoveryConfig::default()
        .with_service_name(&args.service)
        .with_query_interval(Duration::from_secs(args.interval));
    let mut disco = Discovery::new(config);

    log::info!("hunting for {} (interval={}s)", args.service, args.interval);

    let stop_at = Instant::now() + Duration::from_secs(args.duration);
    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];

    while Instant::now() < stop_at {
        while let Some(packet) = disco.poll_write() {
            socket
                .send_to(&packet.message, packet.transport.peer_addr)
                .await?;
        }

        let wait = disco
            .poll_timeout()
            .map(|t| t.saturating_duration_since(Instant::now()))
            .unwrap_or(Duration::from_millis(100));

        tokio::select! {
            result = socket.recv_from(&mut buf) => {
                match result {
                    Ok((len, src)) => {
                        let msg = TaggedBytesMut {
                            now: Instant::now(),
                            transport: TransportContext {
                                local_addr: bind_addr,
                                peer_addr: src,
                                transport_protocol: TransportProtocol::UDP,
                                ecn: None,
                            },
                            message: BytesMut::from(&buf[..len]),
                        };
                        if let Err(e) = disco.handle_read(msg) {
                            log::warn!("failed to handle packet: {e}");
                        }
                    }
                    Err(e) => log::warn!("socket recv error: {e}"),
                }
            }
            _ = tokio::time::sleep(wait) => {
                if let Err(e) = disco.handle_timeout(Instant::now()) {
                    log::warn!("failed to handle timeout: {e}");
                }
            }
        }

        while let Some(DiscoveryEvent::AddressDiscovered(addr)) = disco.poll_event() {
            println!("discovered {addr}");
        }
    }

    println!(
        "done; {} address(es) discovered",
        disco.discovered().len()
    );
    disco.close()?;
    Ok(())
}
