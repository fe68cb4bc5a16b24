//! Scheduler snapshot (opaque)
//!
//! The scheduler's state is sampled independently of the event log and is
//! shown as-is; nothing here interprets or reconciles it.

use std::fs;
use std::path::PathBuf;

use serde_json::{Map, Value};

use crate::error::{Result, ScopeError};

/// Read side of the scheduler's state snapshot
pub trait SchedulerSnapshot: Send + Sync {
    /// Every scheduled entry as (id, handle)
    fn list(&self) -> Result<Vec<(String, Value)>>;

    /// Full opaque state for one entry
    fn get_state(&self, id: &str) -> Result<Option<Value>>;
}

/// Snapshot stored as one JSON object: `{ "<id>": <state>, ... }`
#[derive(Debug, Clone)]
pub struct JsonSchedulerSnapshot {
    path: PathBuf,
}

impl JsonSchedulerSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Result<Map<String, Value>> {
        let text = fs::read_to_string(&self.path).map_err(|e| ScopeError::SchedulerUnavailable {
            reason: format!("{}: {}", self.path.display(), e),
        })?;
        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(ScopeError::SchedulerUnavailable {
                reason: "snapshot is not a JSON object".to_string(),
            }),
            Err(e) => Err(ScopeError::SchedulerUnavailable {
                reason: e.to_string(),
            }),
        }
    }
}

impl SchedulerSnapshot for JsonSchedulerSnapshot {
    fn list(&self) -> Result<Vec<(String, Value)>> {
        Ok(self
            .load()?
            .into_iter()
            .map(|(id, state)| {
                // The handle is whatever the scheduler labels the entry with
                let handle = state.get("handle").cloned().unwrap_or(Value::Null);
                (id, handle)
            })
            .collect())
    }

    fn get_state(&self, id: &str) -> Result<Option<Value>> {
        Ok(self.load()?.remove(id))
    }
}
