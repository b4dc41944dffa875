//! Configuration for the benchmark client and server.
//!
//! Both binaries take their positional workload arguments on the command
//! line and may additionally read a TOML configuration file for timeouts,
//! bind options and logging. CLI arguments take precedence over config
//! file values.

use crate::error::{Error, Result};
use crate::strategy::{TransferParams, WriteStrategy};
use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Command-line arguments for the benchmark client
#[derive(Parser, Debug)]
#[command(name = "wire-bench-client")]
#[command(version = "0.1.0")]
#[command(about = "Send a fixed payload with one of three write strategies and time it", long_about = None)]
pub struct ClientArgs {
    /// Server port
    pub port: String,

    /// Server host name or address
    pub host: String,

    /// Number of transmission rounds
    pub iterations: u32,

    /// Number of data buffers per round
    pub nbufs: usize,

    /// Size of each data buffer in bytes
    pub bufsize: usize,

    /// Write strategy: 1 = multiple writes, 2 = single write, 3 = writev
    #[arg(value_name = "TYPE")]
    pub strategy: u8,

    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Connect timeout per endpoint in milliseconds (0 = none)
    #[arg(long)]
    pub connect_timeout_ms: Option<u64>,

    /// Timeout waiting for the acknowledgment in milliseconds (0 = none)
    #[arg(long)]
    pub ack_timeout_ms: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

/// Command-line arguments for the benchmark server
#[derive(Parser, Debug)]
#[command(name = "wire-bench-server")]
#[command(version = "0.1.0")]
#[command(about = "Receive benchmark payloads and acknowledge with the read count", long_about = None)]
pub struct ServerArgs {
    /// Port to listen on
    pub port: String,

    /// Number of rounds expected from each client
    pub iterations: u32,

    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host to bind (defaults to every local address)
    #[arg(long)]
    pub host: Option<String>,

    /// Bytes expected per round (nbufs * bufsize on the client)
    #[arg(long)]
    pub round_bytes: Option<usize>,

    /// Listen backlog
    #[arg(long)]
    pub backlog: Option<i32>,

    /// Per-read timeout in milliseconds (0 = none)
    #[arg(long)]
    pub read_timeout_ms: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

/// TOML configuration file structure
#[derive(Debug, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub client: ClientSection,
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Client-related configuration
#[derive(Debug, Deserialize, Default)]
pub struct ClientSection {
    /// Connect timeout per endpoint (0 = none)
    #[serde(default)]
    pub connect_timeout_ms: u64,
    /// Acknowledgment read timeout (0 = none)
    #[serde(default)]
    pub ack_timeout_ms: u64,
}

/// Server-related configuration
#[derive(Debug, Deserialize)]
pub struct ServerSection {
    /// Host to bind; absent means passive/any address
    pub host: Option<String>,
    /// Bytes expected per round
    #[serde(default = "default_round_bytes")]
    pub round_bytes: usize,
    /// Listen backlog
    #[serde(default = "default_backlog")]
    pub backlog: i32,
    /// Per-read timeout (0 = none)
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: None,
            round_bytes: default_round_bytes(),
            backlog: default_backlog(),
            read_timeout_ms: default_read_timeout_ms(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_round_bytes() -> usize {
    1500 // 3 buffers x 500 bytes
}

fn default_backlog() -> i32 {
    5
}

fn default_read_timeout_ms() -> u64 {
    30_000
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Zero means "no timeout".
fn millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

impl TomlConfig {
    /// Read the config file if one was given, otherwise use defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(TomlConfig::default());
        };
        let contents = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Final resolved client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub port: String,
    pub host: String,
    pub params: TransferParams,
    pub connect_timeout: Option<Duration>,
    pub ack_timeout: Option<Duration>,
    pub log_level: String,
}

impl ClientConfig {
    /// Load configuration from CLI args and optional TOML file.
    pub fn load() -> Result<Self> {
        Self::from_args(ClientArgs::parse())
    }

    /// Merge parsed CLI args with the TOML file they point at.
    pub fn from_args(cli: ClientArgs) -> Result<Self> {
        let file = TomlConfig::load(cli.config.as_deref())?;

        let strategy = WriteStrategy::try_from(cli.strategy)?;
        let params = TransferParams::new(cli.iterations, cli.nbufs, cli.bufsize, strategy)?;

        Ok(ClientConfig {
            port: cli.port,
            host: cli.host,
            params,
            connect_timeout: millis(
                cli.connect_timeout_ms
                    .unwrap_or(file.client.connect_timeout_ms),
            ),
            ack_timeout: millis(cli.ack_timeout_ms.unwrap_or(file.client.ack_timeout_ms)),
            log_level: cli.log_level.unwrap_or(file.logging.level),
        })
    }
}

/// Final resolved server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: String,
    pub host: Option<String>,
    pub iterations: u32,
    pub round_bytes: usize,
    pub backlog: i32,
    pub read_timeout: Option<Duration>,
    pub log_level: String,
}

impl ServerConfig {
    /// Load configuration from CLI args and optional TOML file.
    pub fn load() -> Result<Self> {
        Self::from_args(ServerArgs::parse())
    }

    /// Merge parsed CLI args with the TOML file they point at.
    pub fn from_args(cli: ServerArgs) -> Result<Self> {
        let file = TomlConfig::load(cli.config.as_deref())?;

        let config = ServerConfig {
            port: cli.port,
            host: cli.host.or(file.server.host),
            iterations: cli.iterations,
            round_bytes: cli.round_bytes.unwrap_or(file.server.round_bytes),
            backlog: cli.backlog.unwrap_or(file.server.backlog),
            read_timeout: millis(cli.read_timeout_ms.unwrap_or(file.server.read_timeout_ms)),
            log_level: cli.log_level.unwrap_or(file.logging.level),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(Error::invalid_config("iterations must be positive"));
        }
        if self.round_bytes == 0 {
            return Err(Error::invalid_config("round bytes must be positive"));
        }
        if self.backlog <= 0 {
            return Err(Error::invalid_config("backlog must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TomlConfig::default();
        assert_eq!(config.server.host, None);
        assert_eq!(config.server.round_bytes, 1500);
        assert_eq!(config.server.backlog, 5);
        assert_eq!(config.server.read_timeout_ms, 30_000);
        assert_eq!(config.client.ack_timeout_ms, 0);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_toml_parsing() {
        let toml_str = r#"
            [client]
            connect_timeout_ms = 250

            [server]
            host = "127.0.0.1"
            round_bytes = 4096
            backlog = 16
            read_timeout_ms = 0

            [logging]
            level = "debug"
        "#;

        let config: TomlConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.client.connect_timeout_ms, 250);
        assert_eq!(config.client.ack_timeout_ms, 0);
        assert_eq!(config.server.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(config.server.round_bytes, 4096);
        assert_eq!(config.server.backlog, 16);
        assert_eq!(config.server.read_timeout_ms, 0);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_client_args() {
        let cli = ClientArgs::try_parse_from([
            "wire-bench-client",
            "2648",
            "localhost",
            "20000",
            "15",
            "100",
            "3",
        ])
        .unwrap();
        let config = ClientConfig::from_args(cli).unwrap();

        assert_eq!(config.port, "2648");
        assert_eq!(config.host, "localhost");
        assert_eq!(config.params.iterations, 20000);
        assert_eq!(config.params.buffer_count, 15);
        assert_eq!(config.params.buffer_size, 100);
        assert_eq!(config.params.strategy, WriteStrategy::Vectored);
        assert_eq!(config.connect_timeout, None);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_client_rejects_bad_strategy() {
        let cli = ClientArgs::try_parse_from([
            "wire-bench-client",
            "2648",
            "localhost",
            "1",
            "1",
            "1",
            "4",
        ])
        .unwrap();
        assert!(matches!(
            ClientConfig::from_args(cli),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_client_rejects_zero_buffers() {
        let cli = ClientArgs::try_parse_from([
            "wire-bench-client",
            "2648",
            "localhost",
            "5",
            "0",
            "500",
            "1",
        ])
        .unwrap();
        assert!(matches!(
            ClientConfig::from_args(cli),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_client_rejects_non_numeric() {
        let parsed = ClientArgs::try_parse_from([
            "wire-bench-client",
            "2648",
            "localhost",
            "many",
            "3",
            "500",
            "1",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_server_args_override_defaults() {
        let cli = ServerArgs::try_parse_from([
            "wire-bench-server",
            "2648",
            "5",
            "--round-bytes",
            "3000",
            "--read-timeout-ms",
            "0",
        ])
        .unwrap();
        let config = ServerConfig::from_args(cli).unwrap();

        assert_eq!(config.port, "2648");
        assert_eq!(config.host, None);
        assert_eq!(config.iterations, 5);
        assert_eq!(config.round_bytes, 3000);
        assert_eq!(config.backlog, 5);
        assert_eq!(config.read_timeout, None);
    }

    #[test]
    fn test_server_rejects_zero_iterations() {
        let cli = ServerArgs::try_parse_from(["wire-bench-server", "2648", "0"]).unwrap();
        assert!(matches!(
            ServerConfig::from_args(cli),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_missing_config_file() {
        let err = TomlConfig::load(Some(Path::new("/nonexistent/wire-bench.toml"))).unwrap_err();
        assert!(matches!(err, Error::ConfigRead { .. }));
    }
}
