//! wire-bench: TCP write-strategy latency benchmark
//!
//! A client sends a fixed payload `iterations` times using one of three
//! write strategies and waits for the server's acknowledgment, which
//! carries the number of read calls the server needed:
//! - Multiple writes: one `write` per buffer
//! - Single write: one `write` of all buffers
//! - Vectored write: one `writev` over all buffers
//!
//! Both sides report elapsed times in microseconds. The server handles
//! every connection in its own task.

pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod net;
pub mod payload;
pub mod protocol;
pub mod server;
pub mod strategy;
pub mod timing;

pub use error::{Error, Result};
