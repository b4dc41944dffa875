//! Benchmark client: one synchronous transfer session.
//!
//! resolve -> connect -> write `iterations` rounds -> read the 4-byte ack.
//! The connection is owned by [`run`] and closed when it returns, on
//! success and on every error path.

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::net;
use crate::protocol::Ack;
use crate::strategy::{self, TransferParams, WriteStats};
use crate::timing::{TimingRecorder, TimingSample};
use std::fmt;
use std::net::TcpStream;
use tracing::{debug, info};

/// Result of one client session.
#[derive(Debug, Clone, Copy)]
pub struct ClientReport {
    pub timing: TimingSample,
    /// Read count returned by the server.
    pub reads: u32,
    pub written: WriteStats,
}

impl fmt::Display for ClientReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "data-transmission time = {} usec, round-trip time = {} usec, #reads = {}",
            self.timing.transfer_us(),
            self.timing.round_trip_us(),
            self.reads
        )
    }
}

/// Run a full session against the configured server.
pub fn run(config: &ClientConfig) -> Result<ClientReport> {
    let endpoints = net::resolve(Some(&config.host), &config.port)?;
    let mut stream = net::connect(&endpoints, config.connect_timeout)?;
    stream.set_read_timeout(config.ack_timeout)?;

    info!(
        iterations = config.params.iterations,
        nbufs = config.params.buffer_count,
        bufsize = config.params.buffer_size,
        strategy = %config.params.strategy,
        "Starting transfer"
    );

    session(&mut stream, &config.params)
}

/// Transfer and acknowledgment over an established connection.
pub fn session(stream: &mut TcpStream, params: &TransferParams) -> Result<ClientReport> {
    let payload = params.payload();

    let mut timer = TimingRecorder::start();
    let written = strategy::transmit(stream, params, &payload)?;
    timer.mark_data();

    debug!(
        bytes = written.bytes,
        calls = written.calls,
        "Data sent, waiting for acknowledgment"
    );

    let ack = Ack::read_from(stream).map_err(|e| match e {
        Error::Io(ref io)
            if matches!(
                io.kind(),
                std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
            ) =>
        {
            Error::ReadTimeout(stream.read_timeout().ok().flatten().unwrap_or_default())
        }
        other => other,
    })?;
    timer.finish();

    Ok(ClientReport {
        timing: timer.sample(),
        reads: ack.reads,
        written,
    })
}
