//! Error types with fix suggestions
//!
//! Error code ranges:
//! - SCOPE-001-009: Event log backend errors
//! - SCOPE-010-019: Program store errors
//! - SCOPE-020-029: Scheduler snapshot errors
//! - SCOPE-030-039: Configuration / CLI input errors
//!
//! Inspection operations never return these: they log and degrade to an
//! empty or absent value. Only backends and CLI setup produce them.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScopeError>;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

#[derive(Error, Debug)]
pub enum ScopeError {
    // ─────────────────────────────────────────────────────────────
    // Event log (SCOPE-001 to SCOPE-009)
    // ─────────────────────────────────────────────────────────────
    #[error("[SCOPE-001] Event log unavailable at '{path}': {reason}")]
    EventLogUnavailable { path: String, reason: String },

    #[error("[SCOPE-002] Malformed event record at byte {offset}: {details}")]
    MalformedEvent { offset: u64, details: String },

    #[error("[SCOPE-003] Cursor '{cursor}' is not a valid position")]
    InvalidCursor { cursor: String },

    // ─────────────────────────────────────────────────────────────
    // Program store (SCOPE-010 to SCOPE-019)
    // ─────────────────────────────────────────────────────────────
    #[error("[SCOPE-010] Program store unavailable at '{path}': {reason}")]
    ProgramStoreUnavailable { path: String, reason: String },

    #[error("[SCOPE-011] Failed to parse program for workflow '{workflow_id}': {details}")]
    ProgramParse { workflow_id: String, details: String },

    // ─────────────────────────────────────────────────────────────
    // Scheduler snapshot (SCOPE-020 to SCOPE-029)
    // ─────────────────────────────────────────────────────────────
    #[error("[SCOPE-020] Scheduler snapshot unavailable: {reason}")]
    SchedulerUnavailable { reason: String },

    // ─────────────────────────────────────────────────────────────
    // Config / input (SCOPE-030 to SCOPE-039)
    // ─────────────────────────────────────────────────────────────
    #[error("[SCOPE-030] Configuration error: {reason}")]
    Config { reason: String },

    #[error("[SCOPE-031] Invalid workflow id '{id}'")]
    InvalidWorkflowId { id: String },

    #[error("[SCOPE-032] No {source_name} configured")]
    SourceNotConfigured { source_name: &'static str },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FixSuggestion for ScopeError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            ScopeError::EventLogUnavailable { .. } => {
                Some("Check --event-log points to a readable JSONL file")
            }
            ScopeError::MalformedEvent { .. } => {
                Some("Each line must be one JSON event with workflow_id, timestamp and kind")
            }
            ScopeError::InvalidCursor { .. } => {
                Some("Use the cursor printed by a previous `events` call, or 0 for the origin")
            }
            ScopeError::ProgramStoreUnavailable { .. } => {
                Some("Check --programs points to a readable directory")
            }
            ScopeError::ProgramParse { .. } => {
                Some("Program files are YAML/JSON with an `op` key on every step")
            }
            ScopeError::SchedulerUnavailable { .. } => {
                Some("The scheduler snapshot must be a JSON object keyed by id")
            }
            ScopeError::Config { .. } => Some("Check ~/.config/flowscope/config.toml syntax"),
            ScopeError::InvalidWorkflowId { .. } => {
                Some("Workflow ids use letters, digits, '_', '-' and '.' (max 128 chars)")
            }
            ScopeError::SourceNotConfigured { .. } => {
                Some("Pass the path as a flag, set it in config.toml, or export FLOWSCOPE_*")
            }
            ScopeError::Io(_) => Some("Check file path and permissions"),
        }
    }
}
