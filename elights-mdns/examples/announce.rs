//! Responder/announcer example.
//!
//! Answers A queries for a hostname and periodically announces a service
//! instance, the way a light accessory would.
//!
//! ```
//! cargo run --package elights-mdns --example announce -- \
//!     --hostname mylight.local --ip 192.168.1.42
//! ```

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};

use bytes::BytesMut;
use clap::Parser;
use elights_mdns::{
    Announcement, Discovery, DiscoveryConfig, MAX_DATAGRAM_SIZE, MulticastSocket,
};
use sansio::Protocol;
use shared::{TaggedBytesMut, TransportContext, TransportProtocol};
use tokio::net::UdpSocket;

#[derive(Parser, Debug)]
#[command(name = "announce")]
#[command(about = "Answer mDNS queries for a hostname and announce a service")]
struct Args {
    /// Hostname to respond for
    #[arg(long, default_value = "elights-test.local")]
    hostname: String,

    /// IPv4 address to advertise
    #[arg(long)]
    ip: Ipv4Addr,

    /// Service type to announce
    #[arg(long, default_value = "_elg._tcp.local")]
    service: String,

    /// Instance name for the announcement
    #[arg(long, default_value = "Test Light")]
    instance: String,

    /// Service port
    #[arg(long, default_value = "9123")]
    port: u16,

    /// Announcement interval in seconds
    #[arg(long, default_value = "30")]
    interval: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let std_socket = MulticastSocket::new().into_std()?;
    let socket = UdpSocket::from_std(std_socket)?;
    let bind_addr: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 5353);

    let config = DiscoveryConfig::default()
        .with_hostname(&args.hostname)
        .with_local_ip(args.ip)
        .with_announcement(Announcement {
            service_type: args.service.clone(),
            instance_name: args.instance.clone(),
            port: args.port,
            txt_records: vec![],
        })
        .with_announce_interval(Duration::from_secs(args.interval));
    let mut disco = Discovery::new(config);

    log::info!(
        "responding for {} -> {} and announcing {} ({})",
        args.hostname,
        args.ip,
        args.instance,
        args.service
    );

    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];

    loop {
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
            _ = tokio::signal::ctrl_c() => {
                log::info!("shutting down");
                break;
            }
        }
    }

    disco.close()?;
    Ok(())
}
