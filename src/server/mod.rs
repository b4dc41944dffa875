//! Benchmark server.
//!
//! A single accept loop hands every connection to its own tokio task and
//! immediately goes back to accepting. A failed accept is logged and the
//! loop continues after a short pause; only resolution and bind failures
//! at startup are fatal.

mod handler;

pub use handler::{handle_connection, receive, Receipt, Session};

use crate::config::ServerConfig;
use crate::error::Result;
use crate::net;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Pause after a failed accept so persistent errors (EMFILE) do not spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Server instance
pub struct Server {
    listener: TcpListener,
    session: Session,
}

impl Server {
    /// Resolve, bind and listen. Must be called inside a tokio runtime.
    pub fn bind(config: &ServerConfig) -> Result<Self> {
        let endpoints = net::resolve(config.host.as_deref(), &config.port)?;
        let listener = net::bind(&endpoints, config.backlog)?;
        listener.set_nonblocking(true)?;
        let listener = TcpListener::from_std(listener)?;

        Ok(Server {
            listener,
            session: Session {
                iterations: config.iterations,
                round_bytes: config.round_bytes,
                read_timeout: config.read_timeout,
            },
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections forever.
    pub async fn run(self) -> Result<()> {
        info!(
            address = %self.local_addr()?,
            iterations = self.session.iterations,
            round_bytes = self.session.round_bytes,
            "Listening for client connection requests"
        );

        let listener = &self.listener;
        accept_loop(move || listener.accept(), self.session, ACCEPT_BACKOFF).await;
        Ok(())
    }

    /// Accept one connection and spawn its handler.
    pub async fn accept_next(&self) -> io::Result<JoinHandle<Result<Receipt>>> {
        let (stream, peer) = self.listener.accept().await?;
        debug!(peer = %peer, "New connection");

        Ok(tokio::spawn(handle_connection(stream, peer, self.session)))
    }
}

/// Spawn a handler for every accepted stream. Never returns.
async fn accept_loop<A, F, S>(mut accept: A, session: Session, backoff: Duration)
where
    A: FnMut() -> F,
    F: Future<Output = io::Result<(S, SocketAddr)>>,
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let mut accepted: u64 = 0;

    loop {
        match accept().await {
            Ok((stream, peer)) => {
                accepted += 1;
                debug!(peer = %peer, conn = accepted, "New connection");
                tokio::spawn(handle_connection(stream, peer, session));
            }
            Err(e) => {
                error!(error = %e, "Failed to accept connection");
                tokio::time::sleep(backoff).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::protocol::Ack;
    use std::collections::VecDeque;
    use std::io::{Read, Write};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

    fn config(iterations: u32, round_bytes: usize) -> ServerConfig {
        ServerConfig {
            port: "0".to_string(),
            host: Some("127.0.0.1".to_string()),
            iterations,
            round_bytes,
            backlog: 5,
            read_timeout: Some(Duration::from_secs(5)),
            log_level: "info".to_string(),
        }
    }

    #[tokio::test]
    async fn test_bind_ephemeral() {
        let server = Server::bind(&config(1, 10)).unwrap();
        let addr = server.local_addr().unwrap();
        assert!(addr.ip().is_loopback());
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn test_bad_port_is_resolution_error() {
        let mut cfg = config(1, 10);
        cfg.port = "not-a-port".to_string();
        assert!(matches!(Server::bind(&cfg), Err(Error::Resolution { .. })));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_connections_are_independent() {
        let server = Server::bind(&config(2, 100)).unwrap();
        let addr = server.local_addr().unwrap();

        // First client connects but stalls after half a round
        let stalled = tokio::task::spawn_blocking(move || {
            let mut stream = std::net::TcpStream::connect(addr).unwrap();
            stream.write_all(&[0u8; 50]).unwrap();
            std::thread::sleep(Duration::from_millis(200));
            drop(stream);
        });
        let first = server.accept_next().await.unwrap();

        // Second client completes while the first is still stalled
        let complete = tokio::task::spawn_blocking(move || {
            let mut stream = std::net::TcpStream::connect(addr).unwrap();
            stream.write_all(&[1u8; 200]).unwrap();
            let mut ack = [0u8; 4];
            stream.read_exact(&mut ack).unwrap();
            Ack::from_bytes(ack)
        });
        let second = server.accept_next().await.unwrap();

        let receipt = second.await.unwrap().unwrap();
        let ack = complete.await.unwrap();
        assert_eq!(u64::from(ack.reads), receipt.reads);
        assert!(receipt.reads >= 2);
        assert_eq!(receipt.bytes, 200);

        stalled.await.unwrap();
        let err = first.await.unwrap().unwrap_err();
        assert!(err.is_connection_closed());
    }

    #[tokio::test]
    async fn test_accept_errors_do_not_stop_the_loop() {
        let (mut client, server_side) = tokio::io::duplex(1024);
        let peer: SocketAddr = "127.0.0.1:40000".parse().unwrap();

        // Two failed accepts, then a real connection, then nothing more
        let mut script: VecDeque<io::Result<DuplexStream>> = VecDeque::from([
            Err(io::Error::new(io::ErrorKind::Other, "too many open files")),
            Err(io::Error::from(io::ErrorKind::ConnectionAborted)),
            Ok(server_side),
        ]);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let accept = move || {
            counter.fetch_add(1, Ordering::SeqCst);
            let next = script.pop_front();
            async move {
                match next {
                    Some(result) => result.map(|stream| (stream, peer)),
                    None => std::future::pending().await,
                }
            }
        };

        let session = Session {
            iterations: 1,
            round_bytes: 10,
            read_timeout: Some(Duration::from_secs(5)),
        };
        let server = tokio::spawn(accept_loop(accept, session, Duration::from_millis(10)));

        client.write_all(&[5u8; 10]).await.unwrap();
        let mut ack = [0u8; 4];
        client.read_exact(&mut ack).await.unwrap();
        assert_eq!(Ack::from_bytes(ack).reads, 1);

        assert!(calls.load(Ordering::SeqCst) >= 3);
        assert!(!server.is_finished());
        server.abort();
    }
}
