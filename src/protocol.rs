//! Acknowledgment wire format.
//!
//! The payload itself is unframed: both sides agree on the byte volume
//! per round out of band. After the last round the server replies with
//! exactly one 4-byte read count in native byte order.
//!
//! ```text
//! client -> server: iterations x (nbufs * bufsize) opaque bytes
//! server -> client: u32 read count (native endian)
//! ```

use crate::error::{is_disconnect, Error, Result};
use std::io::{self, Read};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Size of the acknowledgment on the wire.
pub const ACK_LEN: usize = 4;

/// Number of read calls the server needed to receive one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    pub reads: u32,
}

impl Ack {
    /// Build an acknowledgment, saturating counts that overflow the wire width.
    pub fn new(reads: u64) -> Self {
        Self {
            reads: u32::try_from(reads).unwrap_or(u32::MAX),
        }
    }

    pub fn to_bytes(self) -> [u8; ACK_LEN] {
        self.reads.to_ne_bytes()
    }

    pub fn from_bytes(bytes: [u8; ACK_LEN]) -> Self {
        Self {
            reads: u32::from_ne_bytes(bytes),
        }
    }

    /// Blocking read of exactly one acknowledgment.
    ///
    /// A peer that closes or resets the stream first yields
    /// [`Error::ConnectionClosedEarly`].
    pub fn read_from<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let mut buf = [0u8; ACK_LEN];
        let mut filled = 0;

        while filled < ACK_LEN {
            match reader.read(&mut buf[filled..]) {
                Ok(0) => return Err(closed(filled)),
                Ok(n) => filled += n,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if is_disconnect(&e) => return Err(closed(filled)),
                Err(e) => return Err(e.into()),
            }
        }

        Ok(Self::from_bytes(buf))
    }

    /// Send the acknowledgment on an async stream.
    pub async fn write_to<W: AsyncWrite + Unpin + ?Sized>(self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.to_bytes()).await?;
        writer.flush().await
    }
}

fn closed(received: usize) -> Error {
    Error::ConnectionClosedEarly {
        received: received as u64,
        expected: ACK_LEN as u64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_byte_order() {
        let ack = Ack::new(0x0102_0304);
        assert_eq!(ack.to_bytes(), 0x0102_0304u32.to_ne_bytes());
        assert_eq!(Ack::from_bytes(ack.to_bytes()), ack);
    }

    #[test]
    fn test_saturates() {
        assert_eq!(Ack::new(u64::MAX).reads, u32::MAX);
    }

    #[test]
    fn test_read_from_split_input() {
        // Reads may return the four bytes in pieces.
        let bytes = 7u32.to_ne_bytes();
        let mut reader = io::Read::chain(&bytes[..1], &bytes[1..]);
        assert_eq!(Ack::read_from(&mut reader).unwrap().reads, 7);
    }

    #[test]
    fn test_read_from_truncated() {
        let mut reader: &[u8] = &[1, 2];
        let err = Ack::read_from(&mut reader).unwrap_err();
        assert!(matches!(
            err,
            Error::ConnectionClosedEarly {
                received: 2,
                expected: 4
            }
        ));
    }

    #[tokio::test]
    async fn test_write_to() {
        let mut stream = tokio_test::io::Builder::new()
            .write(&42u32.to_ne_bytes())
            .build();
        Ack::new(42).write_to(&mut stream).await.unwrap();
    }
}
