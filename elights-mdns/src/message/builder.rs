//! Builders for the three packets this system puts on the wire.
//!
//! Wire layout follows the device's announcement format exactly: record
//! order, TTLs and cache-flush bits matter to the light accessories'
//! resolvers, so they are fixed here rather than configurable.

use std::net::Ipv4Addr;

use super::header::Header;
use super::name::Name;
use super::question::Question;
use super::resource::a::APayload;
use super::resource::ptr::PtrPayload;
use super::resource::srv::SrvPayload;
use super::resource::txt::TxtPayload;
use super::resource::{Resource, ResourceHeader};
use super::{CLASS_INET, CLASS_INET_FLUSH, DnsType, Message};
use crate::config::{HOST_TTL, SERVICE_TTL};
use shared::error::*;

/// Build a standard PTR query for a service name.
///
/// Header: QDCOUNT=1, all other counts 0, flags 0x0000. One question with
/// QTYPE=PTR(12), QCLASS=IN(1).
///
/// An empty `qname` is an error; nothing is ever sent for it.
///
/// ```rust
/// let packet = elights_mdns::build_ptr_query("_elg._tcp.local").unwrap();
/// assert_eq!(&packet[..12], &[0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0]);
/// ```
pub fn build_ptr_query(qname: &str) -> Result<Vec<u8>> {
    let name = Name::new(qname)?;
    let mut msg = Message {
        header: Header::default(),
        questions: vec![Question {
            name,
            typ: DnsType::Ptr,
            class: CLASS_INET,
        }],
        ..Default::default()
    };
    msg.pack()
}

/// Build an unsolicited service announcement.
///
/// Header: flags 0x8400 (authoritative response), ANCOUNT=3, ARCOUNT=1.
/// Records in order:
///
/// 1. PTR `service_type` -> `instance_name.service_type`, TTL 4500, IN
/// 2. SRV full instance -> `hostname`:`port`, TTL 120, IN|cache-flush
/// 3. TXT full instance, TTL 4500, IN|cache-flush (single zero byte when
///    `txt_records` is empty)
/// 4. A `hostname` -> `ipv4` in the additional section, TTL 120,
///    IN|cache-flush
///
/// Every required string must be non-empty and `ipv4` must parse as a
/// dotted quad, otherwise an error is returned and nothing is sent.
pub fn build_service_announcement(
    service_type: &str,
    instance_name: &str,
    hostname: &str,
    ipv4: &str,
    port: u16,
    txt_records: &[String],
) -> Result<Vec<u8>> {
    if instance_name.is_empty() {
        return Err(Error::ErrNameEmpty);
    }
    let service = Name::new(service_type)?;
    let host = Name::new(hostname)?;
    let addr: Ipv4Addr = ipv4.parse().map_err(|_| Error::ErrFailedToParseIpaddr)?;
    let full_instance = Name::new(&format!("{instance_name}.{service_type}"))?;

    let mut msg = Message {
        header: Header {
            response: true,
            authoritative: true,
            ..Default::default()
        },
        answers: vec![
            Resource {
                header: ResourceHeader {
                    name: service,
                    class: CLASS_INET, // no cache-flush on shared PTR sets
                    ttl: SERVICE_TTL,
                    ..Default::default()
                },
                body: Some(Box::new(PtrPayload {
                    ptr: full_instance.clone(),
                })),
            },
            Resource {
                header: ResourceHeader {
                    name: full_instance.clone(),
                    class: CLASS_INET_FLUSH,
                    ttl: HOST_TTL,
                    ..Default::default()
                },
                body: Some(Box::new(SrvPayload {
                    priority: 0,
                    weight: 0,
                    port,
                    target: host.clone(),
                })),
            },
            Resource {
                header: ResourceHeader {
                    name: full_instance,
                    class: CLASS_INET_FLUSH,
                    ttl: SERVICE_TTL,
                    ..Default::default()
                },
                body: Some(Box::new(TxtPayload {
                    txt: txt_records.to_vec(),
                })),
            },
        ],
        additionals: vec![a_resource(host, addr)],
        ..Default::default()
    };
    msg.pack()
}

/// Build a standalone A-record announcement (`hostname` -> `ipv4`).
///
/// Header: flags 0x8400, ANCOUNT=1, all other counts 0. Same failure
/// conditions as [`build_service_announcement`].
pub fn build_a_announcement(hostname: &str, ipv4: &str) -> Result<Vec<u8>> {
    let host = Name::new(hostname)?;
    let addr: Ipv4Addr = ipv4.parse().map_err(|_| Error::ErrFailedToParseIpaddr)?;

    let mut msg = Message {
        header: Header {
            response: true,
            authoritative: true,
            ..Default::default()
        },
        answers: vec![a_resource(host, addr)],
        ..Default::default()
    };
    msg.pack()
}

fn a_resource(name: Name, addr: Ipv4Addr) -> Resource {
    Resource {
        header: ResourceHeader {
            name,
            class: CLASS_INET_FLUSH,
            ttl: HOST_TTL,
            ..Default::default()
        },
        body: Some(Box::new(APayload { a: addr.octets() })),
    }
}
