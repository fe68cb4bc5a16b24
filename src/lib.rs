//! flowscope - live introspection for a workflow orchestration engine

pub mod config;
pub mod error;
pub mod event;
pub mod ids;
pub mod inspector;
pub mod log;
pub mod program;
pub mod scheduler;
pub mod status;

pub use config::{ScopeConfig, ViewConfig};
pub use error::{FixSuggestion, ScopeError};
pub use event::{classify, Event, EventKind, KindTag};
pub use inspector::{Inspector, WorkflowDetail, WorkflowSummary};
pub use log::{Cursor, EventLogBackend, EventReader, JsonlEventLog, MemoryEventLog, Page, Pager};
pub use program::{walk, Program, ProgramDef, ProgramNode, ProgramStore};
pub use scheduler::{JsonSchedulerSnapshot, SchedulerSnapshot};
pub use status::{workflow_status, TaskSummary, WorkflowStatus};
