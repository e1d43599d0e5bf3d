//! Local address detection.

use std::net::{IpAddr, Ipv4Addr, UdpSocket};

use anyhow::{Context, Result, bail};

/// Determine the IPv4 address of the interface that carries our LAN
/// traffic, by asking the kernel which source address it would route an
/// outbound datagram from. No packet is actually sent.
pub fn detect_local_ipv4() -> Result<Ipv4Addr> {
    let socket = UdpSocket::bind("0.0.0.0:0").context("failed to bind probe socket")?;
    socket
        .connect("8.8.8.8:80")
        .context("failed to resolve outbound route")?;
    match socket
        .local_addr()
        .context("failed to read probe socket address")?
        .ip()
    {
        IpAddr::V4(ip) => Ok(ip),
        IpAddr::V6(_) => bail!("no IPv4 address available"),
    }
}
