//! Background tasks: the mDNS driver loop and the reconciler.

use std::collections::BTreeSet;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};

use bytes::BytesMut;
use mdns::{Discovery, DiscoveryEvent, MAX_DATAGRAM_SIZE, MDNS_PORT};
use sansio::Protocol;
use shared::{TaggedBytesMut, TransportContext, TransportProtocol};
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::device::DeviceClient;
use crate::directory::DeviceDirectory;

const RECONCILE_TICK: Duration = Duration::from_millis(500);

/// Drive the sans-I/O discovery state machine over the multicast socket:
/// drain queued packets, feed received datagrams, clock the timers, and
/// forward discovered addresses to the reconciler.
pub async fn run_discovery(
    socket: UdpSocket,
    mut disco: Discovery,
    tx: mpsc::Sender<Ipv4Addr>,
    cancel: CancellationToken,
) {
    let bind_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), MDNS_PORT);
    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];

    loop {
        while let Some(packet) = disco.poll_write() {
            if let Err(e) = socket
                .send_to(&packet.message, packet.transport.peer_addr)
                .await
            {
                tracing::warn!("mDNS send failed: {e}");
            }
        }

        let wait = disco
            .poll_timeout()
            .map(|t| t.saturating_duration_since(Instant::now()))
            .unwrap_or(Duration::from_millis(100));

        tokio::select! {
            _ = cancel.cancelled() => break,
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
                            tracing::warn!("failed to handle mDNS packet: {e}");
                        }
                    }
                    Err(e) => tracing::warn!("mDNS recv error: {e}"),
                }
            }
            _ = tokio::time::sleep(wait) => {
                if let Err(e) = disco.handle_timeout(Instant::now()) {
                    tracing::warn!("failed to handle mDNS timeout: {e}");
                }
            }
        }

        while let Some(DiscoveryEvent::AddressDiscovered(addr)) = disco.poll_event() {
            tracing::info!("discovered light at {addr}");
            if tx.send(addr).await.is_err() {
                // Reconciler is gone; nothing left to feed.
                break;
            }
        }
    }

    let _ = disco.close();
    tracing::debug!("discovery task stopped");
}

/// Convert discovered addresses into directory entries. Keeps its own
/// set of every address ever reported, diffs it against the directory on
/// each tick, and fetches metadata for the missing ones; a failed fetch
/// is retried on later ticks because the address stays in the set.
pub async fn run_reconciler(
    directory: DeviceDirectory,
    client: DeviceClient,
    mut rx: mpsc::Receiver<Ipv4Addr>,
    cancel: CancellationToken,
) {
    let mut discovered: BTreeSet<String> = BTreeSet::new();
    let mut tick = tokio::time::interval(RECONCILE_TICK);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            maybe = rx.recv() => match maybe {
                Some(addr) => {
                    discovered.insert(addr.to_string());
                }
                None => break, // discovery task ended
            },
            _ = tick.tick() => {
                let known = directory.known_ips();
                let needed: Vec<String> = discovered.difference(&known).cloned().collect();
                if needed.is_empty() {
                    continue;
                }
                tracing::info!("found {} new device(s) to query", needed.len());
                for ip in needed {
                    match client.accessory_info(&ip).await {
                        Ok(info) => {
                            tracing::info!(
                                "added device {} ({}) at {ip}",
                                info.serial_number,
                                info.display_name
                            );
                            directory.insert(info);
                        }
                        Err(e) => tracing::warn!("failed to get info for {ip}: {e:#}"),
                    }
                }
            }
        }
    }

    tracing::debug!("reconciler task stopped");
}
