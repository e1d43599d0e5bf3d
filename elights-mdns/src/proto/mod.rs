//! Sans-I/O mDNS discovery/responder state machine.
//!
//! [`Discovery`] implements [`sansio::Protocol`] and performs no I/O of
//! its own. The caller owns the multicast socket and drives the state
//! machine:
//!
//! 1. **Network I/O**: feed received datagrams to `handle_read()`, send
//!    everything `poll_write()` returns to 224.0.0.251:5353
//! 2. **Timing**: call `handle_timeout()` when `poll_timeout()` expires;
//!    this is what emits the periodic PTR queries and announcements
//! 3. **Events**: drain `poll_event()` for newly discovered addresses
//!
//! Each call to `handle_read()` processes exactly one datagram:
//!
//! - A **query** packet is scanned for a question about our configured
//!   hostname (QTYPE A or ANY, QCLASS IN or ANY, name compared
//!   case-insensitively without the trailing root dot). The first match
//!   queues a single A-record announcement and ends processing of the
//!   packet.
//! - A **response** packet has its question section skipped, then every
//!   record across answers, authorities and additionals is walked. A
//!   sticky per-packet flag records whether any owner name so far matched
//!   the hunted service name; A records (class IN, with or without the
//!   cache-flush bit) seen while the flag is set contribute their
//!   address to the discovered set. Record bodies that are not inspected
//!   are skipped via their declared RDLENGTH. The flag is deliberately
//!   sticky across the whole packet rather than per-record: real devices
//!   interleave the PTR confirming the service with the A record in
//!   either order, while scoping to one packet keeps unrelated A records
//!   out.
//!
//! Malformed or truncated data silently ends processing of the current
//! packet; on a shared multicast segment a bad packet must never disrupt
//! the service.
//!
//! The discovered set is owned by this state machine, only ever grows
//! (there is no TTL expiry or goodbye handling), and is observable via
//! [`Discovery::discovered`]; each new address is also emitted once as
//! [`DiscoveryEvent::AddressDiscovered`].

use std::collections::{BTreeSet, VecDeque};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Instant;

use bytes::BytesMut;
use shared::error::{Error, Result};
use shared::{TaggedBytesMut, TransportContext, TransportMessage, TransportProtocol};

use crate::config::{DEFAULT_ANNOUNCE_INTERVAL, DEFAULT_QUERY_INTERVAL, DiscoveryConfig};
use crate::message::builder::{build_a_announcement, build_ptr_query, build_service_announcement};
use crate::message::header::{HEADER_LEN, Header};
use crate::message::name::{Name, normalize};
use crate::message::packer::{unpack_uint16, unpack_uint32};
use crate::message::{CLASS_ANY, CLASS_INET, DnsClass, DnsType};

/// The mDNS multicast group address (224.0.0.251).
pub const MDNS_MULTICAST_IPV4: Ipv4Addr = Ipv4Addr::new(224, 0, 0, 251);

/// The standard mDNS port (5353).
pub const MDNS_PORT: u16 = 5353;

/// mDNS multicast destination address (224.0.0.251:5353). All queries
/// and announcements are sent here.
pub const MDNS_DEST_ADDR: SocketAddr = SocketAddr::new(IpAddr::V4(MDNS_MULTICAST_IPV4), MDNS_PORT);

/// Events emitted by the discovery state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryEvent {
    /// An address of the hunted service was seen for the first time.
    AddressDiscovered(Ipv4Addr),
}

/// Sans-I/O mDNS discovery/responder. See the [module docs](self).
pub struct Discovery {
    config: DiscoveryConfig,

    /// Normalized service name to hunt; empty disables discovery.
    service_name: String,

    /// Normalized hostname to answer for; empty disables the responder.
    hostname: String,

    /// Addresses of the hunted service seen so far. Grows only.
    discovered: BTreeSet<Ipv4Addr>,

    /// Outgoing packet queue.
    write_outs: VecDeque<TaggedBytesMut>,

    /// Event queue.
    event_outs: VecDeque<DiscoveryEvent>,

    /// When the next PTR query is due (None = discovery disabled).
    next_query: Option<Instant>,

    /// When the next announcement pair is due (None = disabled).
    next_announce: Option<Instant>,

    closed: bool,
}

impl Discovery {
    /// Create a new discovery state machine.
    ///
    /// The first PTR query and announcement become due immediately; the
    /// driver's first `handle_timeout()` call sends them.
    pub fn new(config: DiscoveryConfig) -> Self {
        let service_name = normalize(&config.service_name);
        let hostname = normalize(&config.hostname);

        let mut config = config;
        if config.query_interval.is_zero() {
            config.query_interval = DEFAULT_QUERY_INTERVAL;
        }
        if config.announce_interval.is_zero() {
            config.announce_interval = DEFAULT_ANNOUNCE_INTERVAL;
        }

        let now = Instant::now();
        let next_query = (!service_name.is_empty()).then_some(now);
        let next_announce = config.announcement.is_some().then_some(now);

        Self {
            config,
            service_name,
            hostname,
            discovered: BTreeSet::new(),
            write_outs: VecDeque::new(),
            event_outs: VecDeque::new(),
            next_query,
            next_announce,
            closed: false,
        }
    }

    /// Addresses of the hunted service seen so far.
    pub fn discovered(&self) -> &BTreeSet<Ipv4Addr> {
        &self.discovered
    }

    /// Whether an address has been discovered.
    pub fn is_discovered(&self, addr: Ipv4Addr) -> bool {
        self.discovered.contains(&addr)
    }

    fn queue_packet(&mut self, raw: Vec<u8>, now: Instant) {
        self.write_outs.push_back(TransportMessage {
            now,
            transport: TransportContext {
                local_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
                peer_addr: MDNS_DEST_ADDR,
                transport_protocol: TransportProtocol::UDP,
                ecn: None,
            },
            message: BytesMut::from(&raw[..]),
        });
    }

    fn send_service_query(&mut self, now: Instant) {
        match build_ptr_query(&self.config.service_name) {
            Ok(raw) => {
                log::trace!("queuing PTR query for {}", self.config.service_name);
                self.queue_packet(raw, now);
            }
            Err(err) => log::warn!("failed to build PTR query: {err}"),
        }
    }

    fn send_announcements(&mut self, now: Instant) {
        let Some(ip) = self.config.local_ip else {
            log::warn!("announcement due but no local_ip configured");
            return;
        };
        let Some(ann) = self.config.announcement.clone() else {
            return;
        };
        let ipv4 = ip.to_string();

        match build_service_announcement(
            &ann.service_type,
            &ann.instance_name,
            &self.config.hostname,
            &ipv4,
            ann.port,
            &ann.txt_records,
        ) {
            Ok(raw) => {
                log::trace!(
                    "queuing announcement for {} ({})",
                    ann.instance_name,
                    ann.service_type
                );
                self.queue_packet(raw, now);
            }
            Err(err) => log::warn!("failed to build service announcement: {err}"),
        }

        match build_a_announcement(&self.config.hostname, &ipv4) {
            Ok(raw) => self.queue_packet(raw, now),
            Err(err) => log::warn!("failed to build A announcement: {err}"),
        }
    }

    fn send_host_answer(&mut self, now: Instant) {
        let Some(ip) = self.config.local_ip else {
            log::warn!("received question for our hostname but no local_ip configured");
            return;
        };
        match build_a_announcement(&self.config.hostname, &ip.to_string()) {
            Ok(raw) => {
                log::trace!("queuing A answer {} -> {ip}", self.config.hostname);
                self.queue_packet(raw, now);
            }
            Err(err) => log::warn!("failed to build A answer: {err}"),
        }
    }

    fn process_packet(&mut self, msg: &TaggedBytesMut) {
        let buf = &msg.message[..];
        if buf.len() < HEADER_LEN {
            // Too short to be valid DNS.
            return;
        }
        let Ok((header, off)) = Header::unpack(buf) else {
            return;
        };

        if !header.response {
            if header.questions > 0 {
                self.process_query(buf, off, &header, msg.now);
            }
        } else {
            self.process_response(buf, off, &header);
        }
    }

    // A query: is someone asking for our hostname?
    fn process_query(&mut self, buf: &[u8], mut off: usize, header: &Header, now: Instant) {
        for _ in 0..header.questions {
            if off >= buf.len() {
                break;
            }
            let (qname, new_off) = Name::unpack(buf, off);
            off = new_off;
            let Ok((qtype, new_off)) = unpack_uint16(buf, off) else {
                break;
            };
            let Ok((qclass, new_off)) = unpack_uint16(buf, new_off) else {
                break;
            };
            off = new_off;

            if (qtype == DnsType::A as u16 || qtype == DnsType::All as u16)
                && (qclass == CLASS_INET.0 || qclass == CLASS_ANY.0)
                && !self.hostname.is_empty()
                && qname.normalized() == self.hostname
            {
                log::debug!("received A query for {qname}, answering");
                self.send_host_answer(now);
                // Only the first matching question is answered.
                break;
            }
        }
    }

    // A response: harvest addresses of the hunted service.
    fn process_response(&mut self, buf: &[u8], mut off: usize, header: &Header) {
        // Skip the question section; names are still parsed so the cursor
        // advances correctly.
        for _ in 0..header.questions {
            off = Name::skip(buf, off);
            if off + 4 > buf.len() {
                return;
            }
            off += 4; // qtype + qclass
        }

        let records =
            header.answers as usize + header.authorities as usize + header.additionals as usize;
        let mut saw_service_name = false;

        for _ in 0..records {
            if off >= buf.len() {
                break;
            }
            let (name, new_off) = Name::unpack(buf, off);
            off = new_off;
            let Ok((typ, new_off)) = unpack_uint16(buf, off) else {
                break;
            };
            let Ok((class, new_off)) = unpack_uint16(buf, new_off) else {
                break;
            };
            let Ok((_ttl, new_off)) = unpack_uint32(buf, new_off) else {
                break;
            };
            let Ok((rdlen, new_off)) = unpack_uint16(buf, new_off) else {
                break;
            };
            off = new_off;
            let rdlen = rdlen as usize;

            // Sticky across the whole packet, not just this record.
            if !self.service_name.is_empty() {
                saw_service_name |= name.normalized() == self.service_name;
            }

            if off + rdlen > buf.len() {
                // Truncated record: drop the rest of the packet.
                break;
            }

            if typ == DnsType::A as u16
                && DnsClass(class).is_inet()
                && rdlen == 4
                && saw_service_name
            {
                let addr = Ipv4Addr::new(buf[off], buf[off + 1], buf[off + 2], buf[off + 3]);
                if self.discovered.insert(addr) {
                    log::debug!("discovered {addr} for {}", self.service_name);
                    self.event_outs
                        .push_back(DiscoveryEvent::AddressDiscovered(addr));
                }
            }

            off += rdlen;
        }
    }
}

impl sansio::Protocol<TaggedBytesMut, (), ()> for Discovery {
    type Rout = ();
    type Wout = TaggedBytesMut;
    type Eout = DiscoveryEvent;
    type Error = Error;
    type Time = Instant;

    /// Process one received datagram.
    ///
    /// Queues an A-record answer if the packet is a query for our
    /// hostname; harvests service addresses if it is a response. Check
    /// `poll_write()` and `poll_event()` afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ErrConnectionClosed`] after `close()`.
    fn handle_read(&mut self, msg: TaggedBytesMut) -> Result<()> {
        if self.closed {
            return Err(Error::ErrConnectionClosed);
        }
        self.process_packet(&msg);
        Ok(())
    }

    /// Discovery doesn't produce read outputs; addresses are delivered
    /// via `poll_event()`.
    fn poll_read(&mut self) -> Option<Self::Rout> {
        None
    }

    /// Not used; outbound traffic is timer-driven.
    fn handle_write(&mut self, _msg: ()) -> Result<()> {
        Ok(())
    }

    /// Get the next packet to send. Call repeatedly until `None`; send
    /// each to `packet.transport.peer_addr` (224.0.0.251:5353).
    fn poll_write(&mut self) -> Option<Self::Wout> {
        self.write_outs.pop_front()
    }

    /// Not used.
    fn handle_event(&mut self, _evt: ()) -> Result<()> {
        Ok(())
    }

    /// Get the next discovery event. Call repeatedly until `None`.
    fn poll_event(&mut self) -> Option<Self::Eout> {
        self.event_outs.pop_front()
    }

    /// Queue the periodic PTR query and/or announcements when due.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ErrConnectionClosed`] after `close()`.
    fn handle_timeout(&mut self, now: Self::Time) -> Result<()> {
        if self.closed {
            return Err(Error::ErrConnectionClosed);
        }

        if let Some(due) = self.next_query
            && due <= now
        {
            self.send_service_query(now);
            self.next_query = Some(now + self.config.query_interval);
        }

        if let Some(due) = self.next_announce
            && due <= now
        {
            self.send_announcements(now);
            self.next_announce = Some(now + self.config.announce_interval);
        }

        Ok(())
    }

    /// The next instant `handle_timeout()` should run, or `None` when
    /// both the query and announcement timers are disabled.
    fn poll_timeout(&mut self) -> Option<Self::Time> {
        match (self.next_query, self.next_announce) {
            (Some(q), Some(a)) => Some(q.min(a)),
            (q, a) => q.or(a),
        }
    }

    /// Close the state machine: clears queues and timers; subsequent
    /// `handle_read()`/`handle_timeout()` calls fail.
    fn close(&mut self) -> Result<()> {
        self.closed = true;
        self.write_outs.clear();
        self.event_outs.clear();
        self.next_query = None;
        self.next_announce = None;
        Ok(())
    }
}

#[cfg(test)]
mod discovery_test;
