//! # hackjudge Common Library
//!
//! Shared code for the hackjudge API server and viewer client:
//! - Document models (projects, judges, criteria, scores, snapshots)
//! - Data access layer over the SQLite-backed document store
//! - Snapshot broadcast bus for the synchronization layer
//! - Results aggregation
//! - Configuration loading
//! - Error taxonomy

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod models;
pub mod results;
pub mod uuid_utils;

pub use error::{ConnectionFailure, Error, Result};
pub use models::Snapshot;
