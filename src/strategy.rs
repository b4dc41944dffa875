//! Write strategies.
//!
//! Every strategy sends the same `buffer_count * buffer_size` bytes per
//! round; only the shape of the write calls differs:
//! - `Multi`: one `write` per buffer
//! - `Single`: one `write` covering all buffers
//! - `Vectored`: one `write_vectored` (writev) describing all buffers
//!
//! Short writes are completed with follow-up calls of the same shape, so
//! the total volume per round never changes. A write that accepts zero
//! bytes is reported as [`Error::PartialWrite`].

use crate::error::{Error, Result};
use crate::payload::Payload;
use std::fmt;
use std::io::{self, Write};
use tracing::trace;

/// How each round is split into write calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStrategy {
    /// `buffer_count` separate writes of `buffer_size` bytes.
    Multi,
    /// One write of the whole round.
    Single,
    /// One scatter write over all buffers.
    Vectored,
}

impl TryFrom<u8> for WriteStrategy {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(WriteStrategy::Multi),
            2 => Ok(WriteStrategy::Single),
            3 => Ok(WriteStrategy::Vectored),
            other => Err(Error::invalid_config(format!(
                "type must be between 1 and 3, got {other}"
            ))),
        }
    }
}

impl fmt::Display for WriteStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteStrategy::Multi => write!(f, "multiple writes"),
            WriteStrategy::Single => write!(f, "single write"),
            WriteStrategy::Vectored => write!(f, "writev"),
        }
    }
}

/// Workload for one client session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferParams {
    pub iterations: u32,
    pub buffer_count: usize,
    pub buffer_size: usize,
    pub strategy: WriteStrategy,
}

impl TransferParams {
    /// Validate and build transfer parameters. All counts must be positive.
    pub fn new(
        iterations: u32,
        buffer_count: usize,
        buffer_size: usize,
        strategy: WriteStrategy,
    ) -> Result<Self> {
        if iterations == 0 {
            return Err(Error::invalid_config("iterations must be positive"));
        }
        if buffer_count == 0 {
            return Err(Error::invalid_config("nbufs must be positive"));
        }
        if buffer_size == 0 {
            return Err(Error::invalid_config("bufsize must be positive"));
        }
        if buffer_count.checked_mul(buffer_size).is_none() {
            return Err(Error::invalid_config("nbufs * bufsize overflows"));
        }

        Ok(Self {
            iterations,
            buffer_count,
            buffer_size,
            strategy,
        })
    }

    /// Bytes sent per round.
    pub fn round_bytes(&self) -> usize {
        self.buffer_count * self.buffer_size
    }

    /// Bytes sent over the whole session.
    pub fn total_bytes(&self) -> u64 {
        self.round_bytes() as u64 * u64::from(self.iterations)
    }

    /// Allocate the payload matching these parameters.
    pub fn payload(&self) -> Payload {
        Payload::new(self.buffer_count, self.buffer_size)
    }
}

/// Accounting for one transmission.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WriteStats {
    /// Bytes accepted by the writer.
    pub bytes: u64,
    /// Write calls issued, including calls that completed a short write.
    pub calls: u64,
}

/// Send `params.iterations` rounds of `payload` using `params.strategy`.
pub fn transmit<W: Write + ?Sized>(
    writer: &mut W,
    params: &TransferParams,
    payload: &Payload,
) -> Result<WriteStats> {
    if payload.len() != params.round_bytes() {
        return Err(Error::invalid_config(format!(
            "payload holds {} bytes, rounds need {}",
            payload.len(),
            params.round_bytes()
        )));
    }

    let mut stats = WriteStats::default();

    for round in 0..params.iterations {
        match params.strategy {
            WriteStrategy::Multi => {
                for segment in payload.segments() {
                    write_buf(writer, segment, &mut stats)?;
                }
            }
            WriteStrategy::Single => write_buf(writer, payload.as_bytes(), &mut stats)?,
            WriteStrategy::Vectored => write_scatter(writer, payload, &mut stats)?,
        }
        trace!(round, bytes = stats.bytes, calls = stats.calls, "Round written");
    }

    Ok(stats)
}

/// Write one contiguous buffer, finishing short writes.
fn write_buf<W: Write + ?Sized>(writer: &mut W, buf: &[u8], stats: &mut WriteStats) -> Result<()> {
    let mut written = 0;

    while written < buf.len() {
        match writer.write(&buf[written..]) {
            Ok(0) => {
                return Err(Error::PartialWrite {
                    written,
                    expected: buf.len(),
                });
            }
            Ok(n) => {
                stats.calls += 1;
                written += n;
            }
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    stats.bytes += written as u64;
    Ok(())
}

/// Write every segment with scatter writes, resuming from the byte offset
/// after a short write.
fn write_scatter<W: Write + ?Sized>(
    writer: &mut W,
    payload: &Payload,
    stats: &mut WriteStats,
) -> Result<()> {
    let total = payload.len();
    let mut written = 0;

    while written < total {
        let io_slices = payload.io_slices(written);
        match writer.write_vectored(&io_slices) {
            Ok(0) => {
                return Err(Error::PartialWrite {
                    written,
                    expected: total,
                });
            }
            Ok(n) => {
                stats.calls += 1;
                written += n;
            }
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    stats.bytes += written as u64;
    Ok(())
}
