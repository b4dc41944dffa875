//! Per-connection receive loop.
//!
//! Each accepted connection gets its own task running [`handle_connection`].
//! The task owns the stream, the counters and the timer; nothing is shared
//! with the accept loop or other connections.

use crate::error::{is_disconnect, Error, Result};
use crate::protocol::Ack;
use crate::timing::TimingRecorder;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tracing::{debug, info, trace, warn};

/// What a server expects from every client session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub iterations: u32,
    /// `nbufs * bufsize` on the client.
    pub round_bytes: usize,
    pub read_timeout: Option<Duration>,
}

impl Session {
    pub fn total_bytes(&self) -> u64 {
        self.round_bytes as u64 * u64::from(self.iterations)
    }
}

/// Outcome of one fully received session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Receipt {
    /// Read calls issued, including short ones. Sent back as the ack.
    pub reads: u64,
    pub bytes: u64,
    /// First read started to last read completed.
    pub elapsed: Duration,
}

/// Serve one client and report the data-receiving time.
///
/// Errors are logged here and returned only so callers that hold the task
/// handle can inspect them; the connection is closed either way.
pub async fn handle_connection<S>(mut stream: S, peer: SocketAddr, session: Session) -> Result<Receipt>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    match receive(&mut stream, &session).await {
        Ok(receipt) => {
            println!("data-receiving time = {} usec", receipt.elapsed.as_micros());
            info!(
                peer = %peer,
                reads = receipt.reads,
                bytes = receipt.bytes,
                elapsed_us = receipt.elapsed.as_micros() as u64,
                "Session complete"
            );
            Ok(receipt)
        }
        Err(e) => {
            warn!(peer = %peer, error = %e, "Session abandoned");
            Err(e)
        }
    }
}

/// Read `iterations` rounds of `round_bytes`, then send the read count.
///
/// A read that returns zero bytes, or a reset, before the volume arrives
/// abandons the session without an acknowledgment.
pub async fn receive<S>(stream: &mut S, session: &Session) -> Result<Receipt>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; session.round_bytes];
    let mut reads: u64 = 0;
    let mut received: u64 = 0;

    let mut timer = TimingRecorder::start();

    for round in 0..session.iterations {
        let mut filled = 0;

        while filled < session.round_bytes {
            let n = read_once(stream, &mut buf[filled..], session.read_timeout).await;
            reads += 1;

            match n {
                Ok(0) => {
                    return Err(Error::ConnectionClosedEarly {
                        received: received + filled as u64,
                        expected: session.total_bytes(),
                    });
                }
                Ok(n) => filled += n,
                Err(Error::Io(e)) if is_disconnect(&e) => {
                    debug!(error = %e, "Peer went away mid-round");
                    return Err(Error::ConnectionClosedEarly {
                        received: received + filled as u64,
                        expected: session.total_bytes(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        received += filled as u64;
        trace!(round, reads, received, "Round received");
    }

    timer.mark_data();
    let elapsed = timer.sample().transfer;

    Ack::new(reads).write_to(stream).await?;

    Ok(Receipt {
        reads,
        bytes: received,
        elapsed,
    })
}

/// One read call, bounded by the optional timeout.
async fn read_once<S>(stream: &mut S, buf: &mut [u8], timeout: Option<Duration>) -> Result<usize>
where
    S: AsyncRead + Unpin,
{
    let n = match timeout {
        Some(limit) => tokio::time::timeout(limit, stream.read(buf))
            .await
            .map_err(|_| Error::ReadTimeout(limit))??,
        None => stream.read(buf).await?,
    };
    Ok(n)
}
