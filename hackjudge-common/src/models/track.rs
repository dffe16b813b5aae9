//! Track tags

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category tag matching judges to the projects they may score
///
/// Tracks compare case-sensitively after trimming surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Track(String);

impl Track {
    pub fn new(name: impl Into<String>) -> Result<Self, String> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err("track must not be empty".to_string());
        }
        Ok(Track(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Track {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Track::new(value)
    }
}

impl From<Track> for String {
    fn from(track: Track) -> Self {
        track.0
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
