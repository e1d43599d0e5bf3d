//! # elights-mdns
//!
//! A hand-rolled, sans-I/O mDNS (Multicast DNS) implementation for
//! discovering and announcing smart-light accessories on a LAN.
//!
//! The crate has three layers:
//!
//! - A DNS wire codec ([`message`]): header, label-sequence names with
//!   compression-pointer decoding, and PTR/SRV/TXT/A resource records.
//! - Packet builders for the three messages this system sends: a PTR
//!   service query, an unsolicited service announcement (PTR+SRV+TXT+A),
//!   and a standalone A-record announcement.
//! - [`Discovery`], a sans-I/O protocol state machine implementing
//!   [`sansio::Protocol`]. It answers A queries for the configured
//!   hostname, harvests addresses of the hunted service from response
//!   packets, and schedules periodic queries and announcements. The
//!   caller owns all I/O: feed received datagrams to `handle_read()`,
//!   drain `poll_write()` to the multicast socket, and clock the state
//!   machine with `handle_timeout()` when `poll_timeout()` expires.
//!
//! ## Event loop pattern
//!
//! ```text
//! loop {
//!     while let Some(packet) = disco.poll_write() {
//!         socket.send_to(&packet.message, packet.transport.peer_addr);
//!     }
//!     select! {
//!         packet = socket.recv_from() => disco.handle_read(packet),
//!         _ = sleep_until(disco.poll_timeout()) => disco.handle_timeout(now),
//!     }
//!     while let Some(event) = disco.poll_event() {
//!         // DiscoveryEvent::AddressDiscovered(addr)
//!     }
//! }
//! ```
//!
//! ## Protocol details
//!
//! - Multicast destination: 224.0.0.251:5353 (IPv4 only)
//! - Queries use flags 0x0000; announcements use 0x8400 (authoritative
//!   response)
//! - Names are never compressed on output; compression pointers are
//!   decoded on input
//! - Decoding is lenient: a malformed packet is ignored, never an error

#![warn(rust_2018_idioms)]
#![allow(dead_code)]

pub mod config;
pub(crate) mod message;
pub(crate) mod proto;
pub(crate) mod socket;

pub use config::{Announcement, DiscoveryConfig, MAX_DATAGRAM_SIZE};
pub use message::builder::{build_a_announcement, build_ptr_query, build_service_announcement};
pub use proto::{Discovery, DiscoveryEvent, MDNS_DEST_ADDR, MDNS_MULTICAST_IPV4, MDNS_PORT};
pub use socket::MulticastSocket;
