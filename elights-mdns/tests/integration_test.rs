//! Integration tests for elights-mdns.
//!
//! These drive a responder instance and a discoverer instance against
//! each other using the sans-I/O pattern, without any network I/O.

use bytes::BytesMut;
use elights_mdns::{
    Announcement, Discovery, DiscoveryConfig, DiscoveryEvent, MDNS_DEST_ADDR, MDNS_PORT,
};
use sansio::Protocol;
use shared::{TaggedBytesMut, TransportContext, TransportProtocol};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};

fn create_message(now: Instant, local: SocketAddr, peer: SocketAddr, data: &[u8]) -> TaggedBytesMut {
    TaggedBytesMut {
        now,
        transport: TransportContext {
            local_addr: local,
            peer_addr: peer,
            transport_protocol: TransportProtocol::UDP,
            ecn: None,
        },
        message: BytesMut::from(data),
    }
}

/// Deliver every multicast packet queued in `from` to `to`, simulating
/// the shared segment. Returns the number of packets delivered.
fn deliver_packets(
    from: &mut Discovery,
    to: &mut Discovery,
    from_addr: SocketAddr,
    to_addr: SocketAddr,
    now: Instant,
) -> usize {
    let mut count = 0;
    while let Some(packet) = from.poll_write() {
        if packet.transport.peer_addr == MDNS_DEST_ADDR {
            let msg = create_message(now, to_addr, from_addr, &packet.message);
            let _ = to.handle_read(msg);
            count += 1;
        }
    }
    count
}

fn addr(a: u8, b: u8, c: u8, d: u8) -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(a, b, c, d)), MDNS_PORT)
}

#[test]
fn test_device_announcement_reaches_discoverer() {
    // A "device" that announces the hunted service type.
    let device_ip = Ipv4Addr::new(192, 168, 1, 42);
    let mut device = Discovery::new(
        DiscoveryConfig::default()
            .with_hostname("elgato-key.local")
            .with_local_ip(device_ip)
            .with_announcement(Announcement {
                service_type: "_elg._tcp.local".to_owned(),
                instance_name: "Key Light".to_owned(),
                port: 9123,
                txt_records: vec!["md=Key Light".to_owned()],
            })
            .with_announce_interval(Duration::from_secs(30)),
    );

    // The controller hunting for that service.
    let mut controller = Discovery::new(
        DiscoveryConfig::default()
            .with_service_name("_elg._tcp.local")
            .with_hostname("elights-controller.local")
            .with_local_ip(Ipv4Addr::new(192, 168, 1, 50)),
    );

    let now = Instant::now();

    // Device's announcement timer fires; its packets reach the controller.
    let deadline = device.poll_timeout().expect("announce timer armed");
    device.handle_timeout(deadline).unwrap();
    let delivered = deliver_packets(
        &mut device,
        &mut controller,
        addr(192, 168, 1, 42),
        addr(192, 168, 1, 50),
        now,
    );
    assert_eq!(delivered, 2); // service announcement + A announcement

    assert_eq!(
        controller.poll_event(),
        Some(DiscoveryEvent::AddressDiscovered(device_ip))
    );
    assert!(controller.is_discovered(device_ip));
}

#[test]
fn test_responder_answers_hostname_query() {
    let responder_ip = Ipv4Addr::new(10, 0, 0, 2);
    let mut responder = Discovery::new(
        DiscoveryConfig::default()
            .with_hostname("elights-controller.local")
            .with_local_ip(responder_ip),
    );

    // A hand-built A query packet, as another host would send it.
    let mut query = vec![
        0x00, 0x00, // ID
        0x00, 0x00, // flags
        0x00, 0x01, // QDCOUNT
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ];
    for label in ["elights-controller", "local"] {
        query.push(label.len() as u8);
        query.extend_from_slice(label.as_bytes());
    }
    query.push(0);
    query.extend_from_slice(&[0x00, 0x01]); // QTYPE = A
    query.extend_from_slice(&[0x00, 0x01]); // QCLASS = IN

    let now = Instant::now();
    responder
        .handle_read(create_message(
            now,
            addr(10, 0, 0, 2),
            addr(10, 0, 0, 9),
            &query,
        ))
        .unwrap();

    let reply = responder.poll_write().expect("responder should answer");
    assert_eq!(reply.transport.peer_addr, MDNS_DEST_ADDR);
    // Authoritative response flags, one answer.
    assert_eq!(&reply.message[2..4], &[0x84, 0x00]);
    assert_eq!(&reply.message[6..8], &[0x00, 0x01]);
    // The RDATA is the last four bytes: our IPv4.
    let rdata = &reply.message[reply.message.len() - 4..];
    assert_eq!(rdata, responder_ip.octets());
}

#[test]
fn test_query_then_announcement_cycle() {
    // Controller queries; device does not parse PTR queries (it announces
    // on its own timer), but the controller's query must not confuse the
    // device either.
    let mut device = Discovery::new(
        DiscoveryConfig::default()
            .with_hostname("elgato-key.local")
            .with_local_ip(Ipv4Addr::new(192, 168, 1, 42))
            .with_announcement(Announcement {
                service_type: "_elg._tcp.local".to_owned(),
                instance_name: "Key Light".to_owned(),
                port: 9123,
                txt_records: vec![],
            }),
    );
    let mut controller = Discovery::new(
        DiscoveryConfig::default()
            .with_service_name("_elg._tcp.local")
            .with_hostname("elights-controller.local")
            .with_local_ip(Ipv4Addr::new(192, 168, 1, 50)),
    );

    let now = Instant::now();

    // Controller's query timer fires.
    let deadline = controller.poll_timeout().expect("query timer armed");
    controller.handle_timeout(deadline).unwrap();
    let delivered = deliver_packets(
        &mut controller,
        &mut device,
        addr(192, 168, 1, 50),
        addr(192, 168, 1, 42),
        now,
    );
    assert_eq!(delivered, 1);
    // A PTR query for the service is not an A query for the device's
    // hostname: no direct reply.
    assert!(device.poll_write().is_none());

    // The device's own announcement cycle gets the controller there.
    let deadline = device.poll_timeout().expect("announce timer armed");
    device.handle_timeout(deadline).unwrap();
    deliver_packets(
        &mut device,
        &mut controller,
        addr(192, 168, 1, 42),
        addr(192, 168, 1, 50),
        now,
    );

    assert!(controller.is_discovered(Ipv4Addr::new(192, 168, 1, 42)));
}

#[test]
fn test_two_devices_both_discovered() {
    let mut controller = Discovery::new(
        DiscoveryConfig::default()
            .with_service_name("_elg._tcp.local")
            .with_hostname("elights-controller.local")
            .with_local_ip(Ipv4Addr::new(192, 168, 1, 50)),
    );

    let now = Instant::now();
    for (ip, name, host) in [
        (Ipv4Addr::new(192, 168, 1, 42), "Key Light", "elgato-key.local"),
        (Ipv4Addr::new(192, 168, 1, 43), "Light Strip", "elgato-strip.local"),
    ] {
        let mut device = Discovery::new(
            DiscoveryConfig::default()
                .with_hostname(host)
                .with_local_ip(ip)
                .with_announcement(Announcement {
                    service_type: "_elg._tcp.local".to_owned(),
                    instance_name: name.to_owned(),
                    port: 9123,
                    txt_records: vec![],
                }),
        );
        let deadline = device.poll_timeout().unwrap();
        device.handle_timeout(deadline).unwrap();
        deliver_packets(
            &mut device,
            &mut controller,
            SocketAddr::new(IpAddr::V4(ip), MDNS_PORT),
            addr(192, 168, 1, 50),
            now,
        );
    }

    assert_eq!(controller.discovered().len(), 2);
    let mut events = Vec::new();
    while let Some(DiscoveryEvent::AddressDiscovered(a)) = controller.poll_event() {
        events.push(a);
    }
    assert_eq!(events.len(), 2);
}
