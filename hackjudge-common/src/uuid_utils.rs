//! UUID utilities
//!
//! Storage keys for projects, judges and criteria are UUIDv4 values rendered
//! in hyphenated lowercase form.

use crate::{Error, Result};
use uuid::Uuid;

/// Generate a new UUIDv4
pub fn generate() -> Uuid {
    Uuid::new_v4()
}

/// Translate an external identifier into a storage key
///
/// Fails with `Error::Validation` for anything that is not a UUID, so a
/// malformed path segment never reaches the store.
pub fn parse_id(kind: &str, raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| Error::validation(format!("invalid {} id: {:?}", kind, raw)))
}

/// Canonical string form of a storage key
pub fn to_external(id: &Uuid) -> String {
    id.hyphenated().to_string()
}

/// Whether two references name the same document
///
/// UUIDs compare by value, so spelling differences (case, braces) do not
/// matter; anything else compares as plain text.
pub fn same_reference(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    match (Uuid::parse_str(a.trim()), Uuid::parse_str(b.trim())) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
