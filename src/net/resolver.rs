//! Host/port resolution into candidate endpoints.

use crate::error::{Error, Result};
use socket2::{Domain, Protocol, Type};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs};
use tracing::debug;

/// One resolved candidate: everything needed to create and connect/bind a socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub domain: Domain,
    pub ty: Type,
    pub protocol: Option<Protocol>,
    pub addr: SocketAddr,
}

impl Endpoint {
    /// A TCP stream endpoint for `addr`.
    pub fn stream(addr: SocketAddr) -> Self {
        Self {
            domain: Domain::for_address(addr),
            ty: Type::STREAM,
            protocol: Some(Protocol::TCP),
            addr,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tcp://{}", self.addr)
    }
}

/// Resolve a host and port into stream endpoints, in resolver order.
///
/// With `host == None` the passive wildcard addresses are returned
/// (IPv4 any first, then IPv6 any), suitable for binding.
///
/// The port must be numeric. Service names such as `http` are not looked
/// up and fail with [`Error::Resolution`].
pub fn resolve(host: Option<&str>, port: &str) -> Result<Vec<Endpoint>> {
    let failure = |reason: String| Error::Resolution {
        host: host.unwrap_or("*").to_string(),
        port: port.to_string(),
        reason,
    };

    let port_num: u16 = port
        .trim()
        .parse()
        .map_err(|_| failure(format!("invalid port '{port}'")))?;

    let endpoints: Vec<Endpoint> = match host {
        None => vec![
            Endpoint::stream(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port_num))),
            Endpoint::stream(SocketAddr::from((Ipv6Addr::UNSPECIFIED, port_num))),
        ],
        Some(name) => (name, port_num)
            .to_socket_addrs()
            .map_err(|e| failure(e.to_string()))?
            .map(Endpoint::stream)
            .collect(),
    };

    if endpoints.is_empty() {
        return Err(failure("no addresses found".to_string()));
    }

    debug!(
        host = host.unwrap_or("*"),
        port = port_num,
        candidates = endpoints.len(),
        "Resolved endpoints"
    );

    Ok(endpoints)
}
