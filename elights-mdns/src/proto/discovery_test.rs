use super::*;
use crate::config::Announcement;
use crate::message::header::Header as DnsHeader;
use crate::message::resource::a::APayload;
use crate::message::resource::ptr::PtrPayload;
use crate::message::resource::{Resource, ResourceHeader};
use crate::message::{CLASS_INET, CLASS_INET_FLUSH, Message};
use crate::message::question::Question;
use sansio::Protocol;
use std::time::Duration;

fn test_config() -> DiscoveryConfig {
    DiscoveryConfig::default()
        .with_service_name("_elg._tcp.local")
        .with_hostname("elights-controller.local")
        .with_local_ip(Ipv4Addr::new(192, 168, 1, 50))
}

fn tagged(raw: Vec<u8>) -> TaggedBytesMut {
    TaggedBytesMut {
        now: Instant::now(),
        transport: TransportContext {
            local_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), MDNS_PORT),
            peer_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 77)), MDNS_PORT),
            transport_protocol: TransportProtocol::UDP,
            ecn: None,
        },
        message: BytesMut::from(&raw[..]),
    }
}

fn ptr_resource(owner: &str, target: &str) -> Resource {
    Resource {
        header: ResourceHeader {
            name: Name::new(owner).unwrap(),
            class: CLASS_INET,
            ttl: 4500,
            ..Default::default()
        },
        body: Some(Box::new(PtrPayload {
            ptr: Name::new(target).unwrap(),
        })),
    }
}

fn a_resource(owner: &str, addr: Ipv4Addr) -> Resource {
    Resource {
        header: ResourceHeader {
            name: Name::new(owner).unwrap(),
            class: CLASS_INET_FLUSH,
            ttl: 120,
            ..Default::default()
        },
        body: Some(Box::new(APayload { a: addr.octets() })),
    }
}

fn response(answers: Vec<Resource>) -> Vec<u8> {
    let mut msg = Message {
        header: DnsHeader {
            response: true,
            authoritative: true,
            ..Default::default()
        },
        answers,
        ..Default::default()
    };
    msg.pack().unwrap()
}

fn a_query(qname: &str, qtype: DnsType) -> Vec<u8> {
    let mut msg = Message {
        header: DnsHeader::default(),
        questions: vec![Question {
            name: Name::new(qname).unwrap(),
            typ: qtype,
            class: CLASS_INET,
        }],
        ..Default::default()
    };
    msg.pack().unwrap()
}

#[test]
fn test_matching_response_inserts_address() {
    let mut disco = Discovery::new(test_config());

    // A real device announcement: PTR confirming the service, then the
    // A record in the additional section.
    let packet = crate::message::builder::build_service_announcement(
        "_elg._tcp.local",
        "Key Light",
        "elgato-key.local",
        "192.168.1.42",
        9123,
        &[],
    )
    .unwrap();

    disco.handle_read(tagged(packet)).unwrap();

    let addr = Ipv4Addr::new(192, 168, 1, 42);
    assert!(disco.is_discovered(addr));
    assert_eq!(
        disco.poll_event(),
        Some(DiscoveryEvent::AddressDiscovered(addr))
    );
    assert!(disco.poll_event().is_none());
}

#[test]
fn test_unrelated_a_record_not_inserted() {
    let mut disco = Discovery::new(test_config());

    let packet = crate::message::builder::build_a_announcement("printer.local", "10.0.0.9").unwrap();
    disco.handle_read(tagged(packet)).unwrap();

    assert!(disco.discovered().is_empty());
    assert!(disco.poll_event().is_none());
}

#[test]
fn test_sticky_flag_gates_on_record_order() {
    // The sticky flag is accumulated in a single pass: an A record that
    // appears after the matching PTR is captured, one that appears before
    // it is not.
    let mut disco = Discovery::new(test_config());

    let addr = Ipv4Addr::new(192, 168, 1, 43);
    let early_a = response(vec![
        a_resource("elgato-air.local", addr),
        ptr_resource("_elg._tcp.local", "Light Air._elg._tcp.local"),
    ]);
    disco.handle_read(tagged(early_a)).unwrap();
    assert!(disco.discovered().is_empty());

    let late_a = response(vec![
        ptr_resource("_elg._tcp.local", "Light Air._elg._tcp.local"),
        a_resource("elgato-air.local", addr),
    ]);
    disco.handle_read(tagged(late_a)).unwrap();
    assert!(disco.is_discovered(addr));
}

#[test]
fn test_sticky_flag_does_not_leak_across_packets() {
    let mut disco = Discovery::new(test_config());

    // First packet sets the flag (PTR only, no A).
    let ptr_only = response(vec![ptr_resource(
        "_elg._tcp.local",
        "Key Light._elg._tcp.local",
    )]);
    disco.handle_read(tagged(ptr_only)).unwrap();

    // Second packet: an unrelated A record. Must not be captured.
    let a_only = response(vec![a_resource("stranger.local", Ipv4Addr::new(10, 0, 0, 5))]);
    disco.handle_read(tagged(a_only)).unwrap();

    assert!(disco.discovered().is_empty());
}

#[test]
fn test_duplicate_address_emits_one_event() {
    let mut disco = Discovery::new(test_config());
    let addr = Ipv4Addr::new(192, 168, 1, 42);

    let packet = response(vec![
        ptr_resource("_elg._tcp.local", "Key Light._elg._tcp.local"),
        a_resource("elgato-key.local", addr),
    ]);
    disco.handle_read(tagged(packet.clone())).unwrap();
    disco.handle_read(tagged(packet)).unwrap();

    assert_eq!(disco.discovered().len(), 1);
    assert_eq!(
        disco.poll_event(),
        Some(DiscoveryEvent::AddressDiscovered(addr))
    );
    assert!(disco.poll_event().is_none());
}

#[test]
fn test_query_for_hostname_is_answered_once() {
    let mut disco = Discovery::new(test_config());

    // Two identical questions; only the first is answered.
    let mut msg = Message {
        header: DnsHeader::default(),
        questions: vec![
            Question {
                name: Name::new("elights-controller.local").unwrap(),
                typ: DnsType::A,
                class: CLASS_INET,
            },
            Question {
                name: Name::new("elights-controller.local").unwrap(),
                typ: DnsType::A,
                class: CLASS_INET,
            },
        ],
        ..Default::default()
    };
    disco.handle_read(tagged(msg.pack().unwrap())).unwrap();

    let reply = disco.poll_write().expect("expected one A-record reply");
    assert!(disco.poll_write().is_none());
    assert_eq!(reply.transport.peer_addr, MDNS_DEST_ADDR);

    let parsed = Message::unpack(&reply.message).unwrap();
    assert!(parsed.header.response);
    assert!(parsed.header.authoritative);
    assert_eq!(parsed.answers.len(), 1);
    assert_eq!(parsed.answers[0].header.name.data, "elights-controller.local");
    let body = parsed.answers[0].body.as_ref().unwrap();
    let a = body.as_any().downcast_ref::<APayload>().unwrap();
    assert_eq!(a.a, [192, 168, 1, 50]);
}

#[test]
fn test_query_matching_is_normalized() {
    let mut disco = Discovery::new(test_config());

    // Mixed case and a trailing root dot still match.
    let packet = a_query("Elights-Controller.LOCAL.", DnsType::A);
    disco.handle_read(tagged(packet)).unwrap();
    assert!(disco.poll_write().is_some());
}

#[test]
fn test_query_any_qtype_is_answered() {
    let mut disco = Discovery::new(test_config());
    let packet = a_query("elights-controller.local", DnsType::All);
    disco.handle_read(tagged(packet)).unwrap();
    assert!(disco.poll_write().is_some());
}

#[test]
fn test_query_for_other_hostname_is_ignored() {
    let mut disco = Discovery::new(test_config());
    let packet = a_query("somebody-else.local", DnsType::A);
    disco.handle_read(tagged(packet)).unwrap();
    assert!(disco.poll_write().is_none());
}

#[test]
fn test_query_ptr_qtype_is_ignored() {
    // Only A and ANY questions are answered, even for our own name.
    let mut disco = Discovery::new(test_config());
    let packet = a_query("elights-controller.local", DnsType::Ptr);
    disco.handle_read(tagged(packet)).unwrap();
    assert!(disco.poll_write().is_none());
}

#[test]
fn test_short_packet_is_dropped() {
    let mut disco = Discovery::new(test_config());
    assert!(disco.handle_read(tagged(vec![0u8; 11])).is_ok());
    assert!(disco.poll_write().is_none());
    assert!(disco.poll_event().is_none());
}

#[test]
fn test_truncated_record_aborts_packet() {
    let mut disco = Discovery::new(test_config());

    let mut packet = response(vec![
        ptr_resource("_elg._tcp.local", "Key Light._elg._tcp.local"),
        a_resource("elgato-key.local", Ipv4Addr::new(192, 168, 1, 42)),
    ]);
    // Chop into the A record's RDATA.
    packet.truncate(packet.len() - 2);

    assert!(disco.handle_read(tagged(packet)).is_ok());
    assert!(disco.discovered().is_empty());
}

#[test]
fn test_oversized_rdlength_aborts_packet() {
    let mut disco = Discovery::new(test_config());

    let mut packet = response(vec![
        ptr_resource("_elg._tcp.local", "Key Light._elg._tcp.local"),
        a_resource("elgato-key.local", Ipv4Addr::new(192, 168, 1, 42)),
    ]);
    // Corrupt the final A record's RDLENGTH (last 6 bytes are len+rdata).
    let len_off = packet.len() - 6;
    packet[len_off] = 0xFF;
    packet[len_off + 1] = 0xFF;

    assert!(disco.handle_read(tagged(packet)).is_ok());
    assert!(disco.discovered().is_empty());
}

#[test]
fn test_timers_queue_query_and_announcements() {
    let config = test_config()
        .with_announcement(Announcement {
            service_type: "_http._tcp.local".to_owned(),
            instance_name: "Elights Controller".to_owned(),
            port: 80,
            txt_records: vec![],
        })
        .with_query_interval(Duration::from_millis(100))
        .with_announce_interval(Duration::from_millis(100));
    let mut disco = Discovery::new(config);

    // Both timers are due immediately.
    let deadline = disco.poll_timeout().expect("timers should be armed");
    disco.handle_timeout(deadline).unwrap();

    // PTR query + service announcement + standalone A announcement.
    let mut packets = Vec::new();
    while let Some(p) = disco.poll_write() {
        packets.push(p);
    }
    assert_eq!(packets.len(), 3);
    for p in &packets {
        assert_eq!(p.transport.peer_addr, MDNS_DEST_ADDR);
    }

    let query = Message::unpack(&packets[0].message).unwrap();
    assert!(!query.header.response);
    assert_eq!(query.questions[0].name.data, "_elg._tcp.local");
    assert_eq!(query.questions[0].typ, DnsType::Ptr);

    let announcement = Message::unpack(&packets[1].message).unwrap();
    assert_eq!(announcement.answers.len(), 3);
    assert_eq!(announcement.additionals.len(), 1);

    // Nothing more until the interval elapses.
    disco.handle_timeout(deadline + Duration::from_millis(50)).unwrap();
    assert!(disco.poll_write().is_none());

    disco
        .handle_timeout(deadline + Duration::from_millis(150))
        .unwrap();
    assert!(disco.poll_write().is_some());
}

#[test]
fn test_query_timer_only_without_announcement() {
    let mut disco = Discovery::new(test_config());
    let deadline = disco.poll_timeout().expect("query timer should be armed");
    disco.handle_timeout(deadline).unwrap();

    let mut count = 0;
    while disco.poll_write().is_some() {
        count += 1;
    }
    assert_eq!(count, 1); // just the PTR query
}

#[test]
fn test_disabled_discovery_has_no_timer() {
    let config = DiscoveryConfig::default()
        .with_hostname("responder-only.local")
        .with_local_ip(Ipv4Addr::new(10, 0, 0, 2));
    let mut disco = Discovery::new(config);
    assert!(disco.poll_timeout().is_none());
}

#[test]
fn test_close_clears_state_and_rejects_io() {
    let mut disco = Discovery::new(test_config());
    let deadline = disco.poll_timeout().unwrap();
    disco.handle_timeout(deadline).unwrap();
    assert!(disco.poll_write().is_some());

    disco.close().unwrap();
    assert!(disco.poll_write().is_none());
    assert!(disco.poll_event().is_none());
    assert!(disco.poll_timeout().is_none());

    let packet = a_query("elights-controller.local", DnsType::A);
    assert_eq!(
        disco.handle_read(tagged(packet)).unwrap_err(),
        Error::ErrConnectionClosed
    );
    assert_eq!(
        disco.handle_timeout(Instant::now()).unwrap_err(),
        Error::ErrConnectionClosed
    );
}
