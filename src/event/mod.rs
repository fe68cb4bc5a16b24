//! Event Module - records read from the orchestration event log
//!
//! Key types:
//! - `Event`: envelope (workflow_id, task_id, timestamp, kind)
//! - `EventKind`: 7 engine kinds + unrecognized catch-all
//! - `KindTag`: canonical classification used for display and rollups

pub mod classify;
mod record;

pub use classify::{classify, classify_kind, KindTag};
pub use record::{Event, EventKind, UnrecognizedKind};
