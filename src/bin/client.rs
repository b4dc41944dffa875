//! wire-bench-client: run one transfer session and print its timings.
//!
//! Usage: `wire-bench-client <port> <host> <iterations> <nbufs> <bufsize> <type>`

use std::process::ExitCode;
use tracing::error;
use wire_bench::config::ClientConfig;
use wire_bench::{client, logging};

fn main() -> ExitCode {
    let config = match ClientConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    logging::init(&config.log_level);

    match client::run(&config) {
        Ok(report) => {
            println!("{report}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Transfer failed");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
