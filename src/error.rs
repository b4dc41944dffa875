//! Error taxonomy for the benchmark client and server.
//!
//! Startup errors (resolution, bind, configuration) are fatal to the
//! process. Transfer errors are fatal to the client session but are
//! contained to a single connection on the server.

use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Host/port could not be translated into any endpoint.
    #[error("could not resolve {host}:{port}: {reason}")]
    Resolution {
        host: String,
        port: String,
        reason: String,
    },

    /// Every candidate endpoint refused or failed the connection.
    #[error("no reachable endpoint among {attempted} candidate(s)")]
    NoReachableEndpoint { attempted: usize },

    /// Every candidate endpoint failed to create or bind a socket.
    #[error("could not bind any of {attempted} candidate endpoint(s)")]
    Bind { attempted: usize },

    /// The connection stopped accepting bytes before the round was written.
    #[error("partial write: {written} of {expected} bytes accepted")]
    PartialWrite { written: usize, expected: usize },

    /// The peer closed (or reset) the connection before the expected volume arrived.
    #[error("connection closed early: {received} of {expected} bytes received")]
    ConnectionClosedEarly { received: u64, expected: u64 },

    /// No data arrived within the configured read timeout.
    #[error("read timed out after {0:?}")]
    ReadTimeout(Duration),

    /// Out-of-range or non-positive argument.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Config file could not be read.
    #[error("failed to read config file '{}': {source}", .path.display())]
    ConfigRead { path: PathBuf, source: io::Error },

    /// Config file could not be parsed.
    #[error("failed to parse config file '{}': {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Any other socket I/O failure.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// Create an invalid configuration error.
    #[inline]
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Whether the error means the peer went away mid-transfer.
    pub fn is_connection_closed(&self) -> bool {
        match self {
            Self::ConnectionClosedEarly { .. } => true,
            Self::Io(e) => is_disconnect(e),
            _ => false,
        }
    }
}

/// I/O error kinds that mean the peer closed or reset the stream.
pub(crate) fn is_disconnect(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
    )
}
