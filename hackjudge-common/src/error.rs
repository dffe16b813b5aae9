//! Common error types for hackjudge
//!
//! Every failure surfaced to a client falls into one of four classes:
//! validation, not-found, connection, or storage. Driver errors are
//! classified on conversion so handlers never inspect `sqlx::Error` directly.

use thiserror::Error;

/// Common result type for hackjudge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Reason the store could not be reached
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionFailure {
    /// Credentials or permissions rejected by the store
    #[error("Database authentication failed: {0}")]
    Authentication(String),

    /// No connection became available within the acquire timeout
    #[error("Timed out waiting for a database connection")]
    Timeout,

    /// Store closed, missing, or otherwise unreachable
    #[error("Database unavailable: {0}")]
    Unavailable(String),
}

/// Common error types across hackjudge crates
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed identifier or payload
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Update or delete target does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Store unreachable
    #[error(transparent)]
    Connection(#[from] ConnectionFailure),

    /// Any other storage failure
    #[error("Database error: {0}")]
    Storage(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Shorthand for a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// Shorthand for a not-found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }
}

// SQLite primary result codes that mean the store itself is unreachable
const SQLITE_PERM: &str = "3";
const SQLITE_CANTOPEN: &str = "14";
const SQLITE_AUTH: &str = "23";

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => Error::Connection(ConnectionFailure::Timeout),
            sqlx::Error::PoolClosed => Error::Connection(ConnectionFailure::Unavailable(
                "connection pool is closed".to_string(),
            )),
            sqlx::Error::Io(e) => Error::Connection(ConnectionFailure::Unavailable(e.to_string())),
            sqlx::Error::Tls(e) => Error::Connection(ConnectionFailure::Unavailable(e.to_string())),
            sqlx::Error::Configuration(e) => Error::Config(e.to_string()),
            sqlx::Error::RowNotFound => Error::NotFound("no matching document".to_string()),
            sqlx::Error::Database(db) => {
                let message = db.message().to_string();
                match db.code().as_deref() {
                    Some(SQLITE_AUTH) | Some(SQLITE_PERM) => {
                        Error::Connection(ConnectionFailure::Authentication(message))
                    }
                    Some(SQLITE_CANTOPEN) => {
                        Error::Connection(ConnectionFailure::Unavailable(message))
                    }
                    _ => Error::Storage(message),
                }
            }
            other => Error::Storage(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Storage(format!("malformed stored document: {}", err))
    }
}
