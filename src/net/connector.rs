//! Client-side connection establishment.

use crate::error::{Error, Result};
use crate::net::Endpoint;
use socket2::{SockAddr, Socket};
use std::net::TcpStream;
use std::time::Duration;
use tracing::{debug, info};

/// Try each endpoint in order and return the first established connection.
///
/// A socket that fails to connect is closed before the next candidate is
/// tried. There is no retry once the list is exhausted.
pub fn connect(endpoints: &[Endpoint], timeout: Option<Duration>) -> Result<TcpStream> {
    for endpoint in endpoints {
        let socket = match Socket::new(endpoint.domain, endpoint.ty, endpoint.protocol) {
            Ok(socket) => socket,
            Err(e) => {
                debug!(%endpoint, error = %e, "Socket creation failed, trying next");
                continue;
            }
        };

        let addr: SockAddr = endpoint.addr.into();
        let connected = match timeout {
            Some(timeout) => socket.connect_timeout(&addr, timeout),
            None => socket.connect(&addr),
        };

        match connected {
            Ok(()) => {
                info!(%endpoint, "Connected");
                return Ok(socket.into());
            }
            Err(e) => {
                // Dropping the socket closes it
                debug!(%endpoint, error = %e, "Connect failed, trying next");
            }
        }
    }

    Err(Error::NoReachableEndpoint {
        attempted: endpoints.len(),
    })
}
