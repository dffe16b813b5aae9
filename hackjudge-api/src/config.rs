//! Server configuration
//!
//! Each setting resolves from the command line or environment first, then
//! the optional TOML file, then the compiled default. Only the database
//! URL has no default: starting without one is a fatal error.

use clap::Parser;
use hackjudge_common::config::FileConfig;
use hackjudge_common::db::{ConnectStrategy, StoreOptions};
use hackjudge_common::{Error, Result};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Command-line arguments for hackjudge-api
#[derive(Parser, Debug, Default)]
#[command(name = "hackjudge-api")]
#[command(about = "Hackathon judging API with live snapshot sync")]
#[command(version)]
pub struct Args {
    /// Database connection string, e.g. sqlite://hackjudge.db
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Address to bind
    #[arg(long, env = "BIND_ADDR")]
    pub bind: Option<String>,

    /// Connection strategy: eager (connect at boot) or lazy (first request)
    #[arg(long, env = "CONNECT_STRATEGY")]
    pub connect: Option<ConnectStrategy>,

    /// Maximum pooled connections
    #[arg(long, env = "MAX_CONNECTIONS")]
    pub max_connections: Option<u32>,

    /// Seconds to wait for a pooled connection before failing
    #[arg(long, env = "ACQUIRE_TIMEOUT_SECS")]
    pub acquire_timeout_secs: Option<u64>,

    /// Reject scores that reference unknown projects or judges
    #[arg(long, env = "STRICT_REFERENCES")]
    pub strict_references: Option<bool>,

    /// Snapshots buffered per SSE viewer before it starts skipping
    #[arg(long, env = "EVENT_CAPACITY")]
    pub event_capacity: Option<usize>,

    /// Optional TOML config file
    #[arg(short, long, env = "HACKJUDGE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Fully resolved server settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub listen: SocketAddr,
    pub store: StoreOptions,
    pub strict_references: bool,
    pub event_capacity: usize,
}

impl ServerConfig {
    /// Resolve settings, reading the config file named in `args` if any
    pub fn resolve(args: Args) -> Result<Self> {
        let file = match &args.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::merge(args, file)
    }

    /// Combine command-line/environment values with file values
    pub fn merge(args: Args, file: FileConfig) -> Result<Self> {
        let database_url = args
            .database_url
            .or(file.database_url)
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| {
                Error::Config("DATABASE_URL is not set (use --database-url or the config file)".to_string())
            })?;

        let bind = args
            .bind
            .or(file.bind)
            .unwrap_or_else(|| DEFAULT_BIND.to_string());
        let ip: IpAddr = bind
            .parse()
            .map_err(|e| Error::Config(format!("invalid bind address '{}': {}", bind, e)))?;
        let port = args.port.or(file.port).unwrap_or(DEFAULT_PORT);

        let store = StoreOptions {
            strategy: args.connect.or(file.connect).unwrap_or_default(),
            max_connections: args
                .max_connections
                .or(file.max_connections)
                .unwrap_or(DEFAULT_MAX_CONNECTIONS),
            acquire_timeout: Duration::from_secs(
                args.acquire_timeout_secs
                    .or(file.acquire_timeout_secs)
                    .unwrap_or(DEFAULT_ACQUIRE_TIMEOUT_SECS),
            ),
        };

        Ok(Self {
            database_url,
            listen: SocketAddr::new(ip, port),
            store,
            strict_references: args
                .strict_references
                .or(file.strict_references)
                .unwrap_or(false),
            event_capacity: args
                .event_capacity
                .or(file.event_capacity)
                .unwrap_or(DEFAULT_EVENT_CAPACITY),
        })
    }
}
