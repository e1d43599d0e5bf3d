//! Socket utilities for mDNS.
//!
//! [`MulticastSocket`] builds a UDP socket properly configured for
//! sharing the mDNS port with other responders on the host.
//!
//! # Example
//!
//! ```rust,ignore
//! use elights_mdns::MulticastSocket;
//!
//! let std_socket = MulticastSocket::new().into_std()?;
//!
//! // For tokio:
//! let socket = tokio::net::UdpSocket::from_std(std_socket)?;
//! ```

use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};

use crate::proto::{MDNS_MULTICAST_IPV4, MDNS_PORT};

/// A builder for multicast UDP sockets suitable for mDNS.
///
/// The resulting socket is:
///
/// - bound to 0.0.0.0:5353 by default (both configurable)
/// - configured with `SO_REUSEADDR`, and `SO_REUSEPORT` on platforms
///   that have it, so it coexists with other mDNS stacks on the host
/// - joined to the 224.0.0.251 multicast group
/// - non-blocking for async drivers, unless a read timeout is requested,
///   in which case it stays blocking with `SO_RCVTIMEO` set (for
///   synchronous polling loops)
#[derive(Debug, Clone)]
pub struct MulticastSocket {
    multicast_local_ipv4: Option<Ipv4Addr>,
    multicast_local_port: Option<u16>,
    interface: Option<Ipv4Addr>,
    read_timeout: Option<Duration>,
}

impl Default for MulticastSocket {
    fn default() -> Self {
        Self::new()
    }
}

impl MulticastSocket {
    pub fn new() -> Self {
        Self {
            multicast_local_ipv4: None,
            multicast_local_port: None,
            interface: None,
            read_timeout: None,
        }
    }

    /// Set the local address to bind instead of the platform default.
    pub fn with_multicast_local_ipv4(mut self, multicast_local_ipv4: Ipv4Addr) -> Self {
        self.multicast_local_ipv4 = Some(multicast_local_ipv4);
        self
    }

    /// Set the local port to bind instead of 5353.
    pub fn with_multicast_local_port(mut self, multicast_local_port: u16) -> Self {
        self.multicast_local_port = Some(multicast_local_port);
        self
    }

    /// Join the multicast group on a specific interface instead of
    /// `INADDR_ANY`.
    pub fn with_interface(mut self, interface: Ipv4Addr) -> Self {
        self.interface = Some(interface);
        self
    }

    /// Leave the socket blocking and set `SO_RCVTIMEO`, for callers that
    /// poll with a bounded synchronous `recv_from`. Without this the
    /// socket is non-blocking (async drivers).
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Build the configured `std::net::UdpSocket`.
    ///
    /// # Errors
    ///
    /// Any failure creating, configuring, binding or joining the
    /// multicast group surfaces as `io::Error`; callers must treat this
    /// as fatal for the discovery service rather than continuing with a
    /// half-configured socket.
    pub fn into_std(self) -> io::Result<UdpSocket> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;

        // Allow coexisting with other mDNS listeners on the host.
        socket.set_reuse_address(true)?;
        #[cfg(all(unix, not(target_os = "solaris"), not(target_os = "illumos")))]
        socket.set_reuse_port(true)?;

        match self.read_timeout {
            Some(timeout) => socket.set_read_timeout(Some(timeout))?,
            None => socket.set_nonblocking(true)?,
        }

        let multicast_local_ip = if let Some(multicast_local_ipv4) = self.multicast_local_ipv4 {
            IpAddr::V4(multicast_local_ipv4)
        } else if cfg!(target_os = "linux") {
            IpAddr::V4(MDNS_MULTICAST_IPV4)
        } else {
            // Binding the group address doesn't work on Mac/Win; only
            // 0.0.0.0 does.
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        };

        let multicast_local_port = self.multicast_local_port.unwrap_or(MDNS_PORT);
        let multicast_local_addr = SocketAddr::new(multicast_local_ip, multicast_local_port);

        socket.bind(&multicast_local_addr.into())?;

        let iface = self.interface.unwrap_or(Ipv4Addr::UNSPECIFIED);
        socket.join_multicast_v4(&MDNS_MULTICAST_IPV4, &iface)?;

        Ok(socket.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multicast_constants() {
        assert_eq!(MDNS_MULTICAST_IPV4, Ipv4Addr::new(224, 0, 0, 251));
        assert_eq!(MDNS_PORT, 5353);
    }

    #[test]
    fn test_multicast_socket_builder() {
        let builder = MulticastSocket::new()
            .with_multicast_local_ipv4(Ipv4Addr::UNSPECIFIED)
            .with_multicast_local_port(5353);
        assert!(builder.multicast_local_ipv4.is_some());
        assert!(builder.multicast_local_port.is_some());
        assert!(builder.interface.is_none());
        assert!(builder.read_timeout.is_none());
    }

    #[test]
    fn test_multicast_socket_with_interface() {
        let interface = Ipv4Addr::new(192, 168, 1, 100);
        let builder = MulticastSocket::new()
            .with_interface(interface)
            .with_read_timeout(Duration::from_secs(2));
        assert_eq!(builder.interface, Some(interface));
        assert_eq!(builder.read_timeout, Some(Duration::from_secs(2)));
    }

    // Socket creation tests would require network access and might
    // conflict with other mDNS services, so we keep them out.
}
