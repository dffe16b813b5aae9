//! Configuration file loading
//!
//! Settings resolve in priority order:
//! 1. Command-line argument or environment variable (highest priority)
//! 2. TOML config file
//! 3. Compiled default (fallback)
//!
//! Binaries own the first and last tiers; this module reads the file tier.

use crate::db::ConnectStrategy;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Optional settings read from a TOML file
///
/// Every field is optional so a file may set any subset.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub database_url: Option<String>,
    pub port: Option<u16>,
    pub bind: Option<String>,
    pub connect: Option<ConnectStrategy>,
    pub max_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub strict_references: Option<bool>,
    pub event_capacity: Option<usize>,
}

impl FileConfig {
    /// Parse a config file
    ///
    /// A missing or malformed file is an error: the path was named
    /// explicitly, so silently ignoring it would hide a mistake.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read config file {}: {}", path.display(), e))
        })?;
        let config = Self::parse(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        info!("Loaded config file {}", path.display());
        Ok(config)
    }

    pub fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
