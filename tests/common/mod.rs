use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener};

use edge_addr::IpVersion;

/// Asks the OS for a port nothing is currently bound to on the loopback
/// address of `version`.
///
/// The port is released before returning, so another process could take it
/// in between; callers treat EADDRINUSE as a reason to retry.
pub fn unused_port(version: IpVersion) -> u16 {
    let loopback: SocketAddr = match version {
        IpVersion::V4 => (Ipv4Addr::LOCALHOST, 0).into(),
        IpVersion::V6 => (Ipv6Addr::LOCALHOST, 0).into(),
    };

    let listener = TcpListener::bind(loopback).expect("failed to bind an ephemeral port");
    listener.local_addr().expect("bound listener has no local address").port()
}

// Loopback IPv6 can be disabled in containers.
pub fn ipv6_available() -> bool {
    TcpListener::bind((Ipv6Addr::LOCALHOST, 0)).is_ok()
}
