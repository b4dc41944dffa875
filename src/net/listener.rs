//! Server-side bind and listen.

use crate::error::{Error, Result};
use crate::net::Endpoint;
use socket2::Socket;
use std::io;
use std::net::TcpListener;
use tracing::{debug, info};

/// Listen backlog used when none is configured.
pub const DEFAULT_BACKLOG: i32 = 5;

/// Bind the first endpoint that accepts a socket and start listening.
///
/// `SO_REUSEADDR` is enabled on every candidate so a restarted server
/// can take the port back immediately. Candidates that fail are closed
/// before the next one is tried.
pub fn bind(endpoints: &[Endpoint], backlog: i32) -> Result<TcpListener> {
    let socket = endpoints
        .iter()
        .find_map(|endpoint| match bind_one(endpoint) {
            Ok(socket) => {
                info!(%endpoint, "Bound");
                Some(socket)
            }
            Err(e) => {
                debug!(%endpoint, error = %e, "Bind failed, trying next");
                None
            }
        })
        .ok_or(Error::Bind {
            attempted: endpoints.len(),
        })?;

    socket.listen(backlog)?;
    Ok(socket.into())
}

fn bind_one(endpoint: &Endpoint) -> io::Result<Socket> {
    let socket = Socket::new(endpoint.domain, endpoint.ty, endpoint.protocol)?;
    socket.set_reuse_address(true)?;
    socket.bind(&endpoint.addr.into())?;
    Ok(socket)
}
