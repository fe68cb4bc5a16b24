//! Log Module - read side of the orchestration event log
//!
//! Key types:
//! - `Cursor`: opaque forward-only position
//! - `EventLogBackend`: the external log (memory / JSONL implementations)
//! - `EventReader`: total paging, replay and aggregates
//! - `Pager`: back/forward browsing with a caller-held cursor stack

mod backend;
mod cursor;
mod pager;
mod reader;

pub use backend::{EventLogBackend, JsonlEventLog, MemoryEventLog};
pub use cursor::Cursor;
pub use pager::{Page, Pager};
pub use reader::{EventReader, REPLAY_PAGE_SIZE};
