//! Event log backends
//!
//! The log itself belongs to the orchestration engine; this tool only reads
//! it through [`EventLogBackend`]. Two implementations:
//! - `MemoryEventLog`: thread-safe, append-only, in-process (tests, embedding)
//! - `JsonlEventLog`: one JSON event per line, cursor = byte offset

use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::warn;

use super::cursor::Cursor;
use crate::error::{Result, ScopeError};
use crate::event::Event;

/// Read side of the engine's event log
pub trait EventLogBackend: Send + Sync {
    /// Cursor preceding all events
    fn origin(&self) -> Result<Cursor>;

    /// At most `limit` events strictly after `after`, in log order, plus the
    /// cursor following the last returned event (`after` if none).
    fn fetch(&self, after: Cursor, limit: usize) -> Result<(Vec<Event>, Cursor)>;
}

// ═══════════════════════════════════════════════════════════════
// In-memory log
// ═══════════════════════════════════════════════════════════════

/// Thread-safe, append-only event log held in memory
#[derive(Clone, Default)]
pub struct MemoryEventLog {
    events: Arc<RwLock<Vec<Event>>>,
}

impl MemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a log pre-filled with `events`, in order
    pub fn from_events(events: impl IntoIterator<Item = Event>) -> Self {
        Self {
            events: Arc::new(RwLock::new(events.into_iter().collect())),
        }
    }

    /// Producer-side append (returns the event's 0-based position)
    pub fn append(&self, event: Event) -> u64 {
        let mut events = self.events.write();
        events.push(event);
        (events.len() - 1) as u64
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventLogBackend for MemoryEventLog {
    fn origin(&self) -> Result<Cursor> {
        Ok(Cursor::ORIGIN)
    }

    fn fetch(&self, after: Cursor, limit: usize) -> Result<(Vec<Event>, Cursor)> {
        let Some(start) = after.position() else {
            return Ok((Vec::new(), after));
        };
        let events = self.events.read();
        let start = usize::try_from(start).unwrap_or(usize::MAX).min(events.len());
        let end = start.saturating_add(limit).min(events.len());
        let page = events[start..end].to_vec();
        let next = if page.is_empty() {
            after
        } else {
            Cursor::at(end as u64)
        };
        Ok((page, next))
    }
}

impl std::fmt::Debug for MemoryEventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryEventLog")
            .field("len", &self.len())
            .finish()
    }
}

// ═══════════════════════════════════════════════════════════════
// JSONL file log
// ═══════════════════════════════════════════════════════════════

/// Event log stored as newline-delimited JSON.
///
/// Cursors are byte offsets of line starts. A trailing line without its
/// newline is still being written by the producer and is left for a later
/// fetch. Blank lines are skipped; malformed lines are logged and skipped.
#[derive(Debug, Clone)]
pub struct JsonlEventLog {
    path: PathBuf,
}

impl JsonlEventLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> Result<File> {
        File::open(&self.path).map_err(|e| ScopeError::EventLogUnavailable {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

impl EventLogBackend for JsonlEventLog {
    fn origin(&self) -> Result<Cursor> {
        self.open()?;
        Ok(Cursor::ORIGIN)
    }

    fn fetch(&self, after: Cursor, limit: usize) -> Result<(Vec<Event>, Cursor)> {
        let Some(start) = after.position() else {
            return Ok((Vec::new(), after));
        };
        if limit == 0 {
            return Ok((Vec::new(), after));
        }

        let mut file = self.open()?;
        file.seek(SeekFrom::Start(start))?;
        let mut reader = BufReader::new(file);

        let mut events = Vec::with_capacity(limit.min(512));
        let mut offset = start;
        let mut next = after;
        let mut line = Vec::new();

        while events.len() < limit {
            line.clear();
            // Raw bytes: a line that is not UTF-8 is one malformed record
            let read = reader.read_until(b'\n', &mut line)?;
            if read == 0 || line.last() != Some(&b'\n') {
                break;
            }
            let line_start = offset;
            offset += read as u64;

            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            match serde_json::from_slice::<Event>(&line) {
                Ok(event) => {
                    events.push(event);
                    next = Cursor::at(offset);
                }
                Err(e) => {
                    let err = ScopeError::MalformedEvent {
                        offset: line_start,
                        details: e.to_string(),
                    };
                    warn!(path = %self.path.display(), error = %err, "skipping malformed event");
                }
            }
        }

        Ok((events, next))
    }
}
