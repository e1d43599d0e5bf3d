//! Configuration for the [`Discovery`](crate::Discovery) protocol.

use std::net::Ipv4Addr;
use std::time::Duration;

/// Default interval between PTR queries for the hunted service (30 seconds).
pub(crate) const DEFAULT_QUERY_INTERVAL: Duration = Duration::from_secs(30);

/// Default interval between unsolicited announcements (30 seconds).
pub(crate) const DEFAULT_ANNOUNCE_INTERVAL: Duration = Duration::from_secs(30);

/// TTL for PTR and TXT records in announcements (seconds).
pub(crate) const SERVICE_TTL: u32 = 4500;

/// TTL for SRV and A records in announcements (seconds).
pub(crate) const HOST_TTL: u32 = 120;

/// Largest datagram the protocol will process; callers should size their
/// receive buffers to this.
pub const MAX_DATAGRAM_SIZE: usize = 1500;

/// Description of the service this host announces on the network.
#[derive(Clone, Debug)]
pub struct Announcement {
    /// Service type, e.g. `"_http._tcp.local"`.
    pub service_type: String,
    /// Human-readable instance name, e.g. `"Elights Controller"`.
    pub instance_name: String,
    /// Port the service listens on.
    pub port: u16,
    /// TXT record strings (`key=value`); may be empty.
    pub txt_records: Vec<String>,
}

/// Configuration for a [`Discovery`](crate::Discovery) instance.
///
/// Built with the `with_*` methods:
///
/// ```rust
/// use elights_mdns::DiscoveryConfig;
/// use std::net::Ipv4Addr;
///
/// let config = DiscoveryConfig::default()
///     .with_service_name("_elg._tcp.local")
///     .with_hostname("elights-controller.local")
///     .with_local_ip(Ipv4Addr::new(192, 168, 1, 50));
/// ```
#[derive(Clone, Debug)]
pub struct DiscoveryConfig {
    /// Service name to hunt for in response packets (PTR qname).
    ///
    /// Empty disables discovery: no periodic queries are sent and no
    /// addresses are harvested.
    pub service_name: String,

    /// Hostname this instance answers A queries for.
    ///
    /// Empty disables the responder.
    pub hostname: String,

    /// IPv4 address advertised in A records. Required for the responder
    /// and for announcements; without it queries for `hostname` are
    /// logged and dropped.
    pub local_ip: Option<Ipv4Addr>,

    /// Unsolicited service announcement sent every `announce_interval`.
    /// `None` disables announcements.
    pub announcement: Option<Announcement>,

    /// Interval between PTR queries for `service_name`.
    pub query_interval: Duration,

    /// Interval between unsolicited announcements.
    pub announce_interval: Duration,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            service_name: String::new(),
            hostname: String::new(),
            local_ip: None,
            announcement: None,
            query_interval: DEFAULT_QUERY_INTERVAL,
            announce_interval: DEFAULT_ANNOUNCE_INTERVAL,
        }
    }
}

impl DiscoveryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the service name to discover (e.g. `"_elg._tcp.local"`).
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }

    /// Set the hostname this instance responds for.
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    /// Set the advertised IPv4 address.
    pub fn with_local_ip(mut self, ip: Ipv4Addr) -> Self {
        self.local_ip = Some(ip);
        self
    }

    /// Enable periodic unsolicited service announcements.
    pub fn with_announcement(mut self, announcement: Announcement) -> Self {
        self.announcement = Some(announcement);
        self
    }

    /// Set the PTR query interval. Zero falls back to the default.
    pub fn with_query_interval(mut self, interval: Duration) -> Self {
        self.query_interval = interval;
        self
    }

    /// Set the announcement interval. Zero falls back to the default.
    pub fn with_announce_interval(mut self, interval: Duration) -> Self {
        self.announce_interval = interval;
        self
    }
}
