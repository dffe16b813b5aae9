//! Data access layer
//!
//! The persistent store is a set of document collections kept in SQLite:
//! each row holds one JSON document plus the columns needed for lookups and
//! cascades. `Store` owns the connection pool; handlers receive it through
//! application state rather than a process-wide handle.

pub mod documents;
mod schema;
pub mod scores;
pub mod snapshot;

use crate::{Error, Result};
use serde::Deserialize;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// When the pool opens its first connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectStrategy {
    /// Connect and create the schema before serving requests
    #[default]
    Eager,
    /// Connect on first use; the schema is ensured by the first request
    Lazy,
}

impl FromStr for ConnectStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "eager" => Ok(ConnectStrategy::Eager),
            "lazy" => Ok(ConnectStrategy::Lazy),
            other => Err(format!(
                "unknown connect strategy '{}' (expected 'eager' or 'lazy')",
                other
            )),
        }
    }
}

impl fmt::Display for ConnectStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectStrategy::Eager => f.write_str("eager"),
            ConnectStrategy::Lazy => f.write_str("lazy"),
        }
    }
}

/// Pool settings
#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub strategy: ConnectStrategy,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            strategy: ConnectStrategy::Eager,
            max_connections: 10,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

/// Shared handle to the persistent store
///
/// Cloning is cheap; all clones share one pool.
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
    schema_ready: Arc<OnceCell<()>>,
}

impl Store {
    /// Open the store at `url` using the configured connect strategy
    pub async fn open(url: &str, options: &StoreOptions) -> Result<Self> {
        if url.trim().is_empty() {
            return Err(Error::Config("database URL is empty".to_string()));
        }

        let connect_options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool_options = SqlitePoolOptions::new()
            .max_connections(options.max_connections.max(1))
            .acquire_timeout(options.acquire_timeout);

        match options.strategy {
            ConnectStrategy::Eager => {
                let pool = pool_options.connect_with(connect_options).await?;
                let store = Self::from_pool(pool);
                store.pool().await?;
                info!("Connected to document store (eager)");
                Ok(store)
            }
            ConnectStrategy::Lazy => {
                let pool = pool_options.connect_lazy_with(connect_options);
                info!("Document store configured for lazy connection");
                Ok(Self::from_pool(pool))
            }
        }
    }

    /// Private in-memory store
    ///
    /// Backed by a single connection so every query sees the same database.
    pub async fn open_in_memory() -> Result<Self> {
        let connect_options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(connect_options)
            .await?;
        let store = Self::from_pool(pool);
        store.pool().await?;
        Ok(store)
    }

    /// Wrap an existing pool; the schema is created on first use
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            schema_ready: Arc::new(OnceCell::new()),
        }
    }

    /// Pool with the schema guaranteed to exist
    pub async fn pool(&self) -> Result<&SqlitePool> {
        self.schema_ready
            .get_or_try_init(|| async {
                debug!("Ensuring document store schema");
                schema::ensure(&self.pool).await
            })
            .await?;
        Ok(&self.pool)
    }

    /// Round-trip a trivial query
    pub async fn ping(&self) -> Result<()> {
        let pool = self.pool().await?;
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }

    /// Close the pool; later operations fail with a connection error
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
