//! Forward-only position marker into the event log

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ScopeError;

/// Opaque, totally-ordered position in the event log.
///
/// The origin precedes every event. The inert cursor is what a failed
/// `origin()` hands out: fetching from it yields nothing and echoes it back.
/// Inert sorts before the origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(Option<u64>);

impl Cursor {
    pub const ORIGIN: Cursor = Cursor(Some(0));
    pub const INERT: Cursor = Cursor(None);

    /// Cursor at a backend-defined offset
    pub const fn at(position: u64) -> Self {
        Cursor(Some(position))
    }

    /// Backend offset, `None` for the inert cursor
    pub fn position(self) -> Option<u64> {
        self.0
    }

    pub fn is_inert(self) -> bool {
        self.0.is_none()
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::ORIGIN
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(pos) => write!(f, "{pos}"),
            None => f.write_str("-"),
        }
    }
}

impl FromStr for Cursor {
    type Err = ScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "origin" => Ok(Self::ORIGIN),
            "-" => Ok(Self::INERT),
            other => other
                .parse::<u64>()
                .map(Self::at)
                .map_err(|_| ScopeError::InvalidCursor {
                    cursor: s.to_string(),
                }),
        }
    }
}
