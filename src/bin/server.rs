//! wire-bench-server: accept benchmark clients until killed.
//!
//! Usage: `wire-bench-server <port> <iterations>`

use std::process::ExitCode;
use tracing::{error, info};
use wire_bench::config::ServerConfig;
use wire_bench::logging;
use wire_bench::server::Server;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    logging::init(&config.log_level);

    info!(
        port = %config.port,
        host = config.host.as_deref().unwrap_or("*"),
        iterations = config.iterations,
        round_bytes = config.round_bytes,
        read_timeout = ?config.read_timeout,
        "Starting wire-bench server"
    );

    let server = match Server::bind(&config) {
        Ok(server) => server,
        Err(e) => {
            error!(error = %e, "Startup failed");
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match server.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Server stopped");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
