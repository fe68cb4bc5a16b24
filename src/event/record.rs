//! Event records as the orchestration engine appends them.
//!
//! - Event: envelope with workflow/task correlation + timestamp + kind
//! - EventKind: 7 known variants, plus a catch-all for kinds this tool
//!   does not know yet (kept, never dropped)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Single event in the orchestration event log
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    /// Workflow this event belongs to (always present)
    pub workflow_id: String,
    /// Task within the workflow, absent for workflow-level events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    /// Event type and data
    pub kind: EventKind,
}

impl Event {
    /// Build an event stamped with the current time
    pub fn new(workflow_id: impl Into<String>, task_id: Option<&str>, kind: EventKind) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            task_id: task_id.map(str::to_string),
            timestamp: Utc::now(),
            kind,
        }
    }

    /// Shorthand for a task-level event
    pub fn task(workflow_id: impl Into<String>, task_id: &str, kind: EventKind) -> Self {
        Self::new(workflow_id, Some(task_id), kind)
    }
}

/// All event kinds the engine emits.
///
/// Unknown `type` tags (or known tags whose fields don't match) land in
/// [`EventKind::Other`], which keeps the declared name for classification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// Task is ready to be scheduled
    Ready {
        module: String,
        #[serde(default)]
        payload: Value,
    },
    /// Task attempt picked up by one or more agents
    Started {
        #[serde(default)]
        agent_ids: Vec<String>,
    },
    Completed {
        attempt: u32,
        #[serde(default)]
        result: Value,
    },
    Failed {
        attempt: u32,
        #[serde(default)]
        reason: Value,
        #[serde(default)]
        retriable: bool,
    },
    Pending,
    Preempted,
    Progress {
        #[serde(default)]
        progress: Value,
    },
    #[serde(untagged)]
    Other(UnrecognizedKind),
}

/// A kind this tool has no variant for
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnrecognizedKind {
    /// The producer's own kind name
    #[serde(rename = "type")]
    pub declared: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl EventKind {
    /// Build an unrecognized kind with no extra fields
    pub fn other(declared: impl Into<String>) -> Self {
        Self::Other(UnrecognizedKind {
            declared: declared.into(),
            fields: Map::new(),
        })
    }

    /// Attempt number carried by completion/failure events
    pub fn attempt(&self) -> Option<u32> {
        match self {
            Self::Completed { attempt, .. } | Self::Failed { attempt, .. } => Some(*attempt),
            Self::Other(raw) => raw
                .fields
                .get("attempt")
                .and_then(Value::as_u64)
                .and_then(|a| u32::try_from(a).ok()),
            _ => None,
        }
    }
}
