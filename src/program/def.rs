//! Data-only program definitions (YAML/JSON) compiled into [`Program`] values.
//!
//! A definition is a tree of steps keyed by `op`, each with an optional
//! `then` successor:
//!
//! ```yaml
//! op: run
//! task_id: extract
//! module: etl.extract
//! then:
//!   op: branch          # needs extract's real result
//!   on: rows
//!   cases:
//!     "0": { op: done }
//!   otherwise: { op: run, task_id: load, module: etl.load }
//! ```
//!
//! Nodes that don't parse as a known step are kept raw and compile to
//! `Program::Opaque`, so one bad node never hides the rest of the tree.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::value::{Continuation, Program, ResumeError};

/// One node of a stored program definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProgramDef {
    Step(StepDef),
    /// Anything else, kept as written
    Opaque(Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum StepDef {
    Done,
    Run {
        task_id: String,
        module: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        then: Option<Box<ProgramDef>>,
    },
    Sequence {
        items: Vec<ProgramDef>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        then: Option<Box<ProgramDef>>,
    },
    Parallel {
        items: Vec<ProgramDef>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        then: Option<Box<ProgramDef>>,
    },
    Unfold {
        body: Box<ProgramDef>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        then: Option<Box<ProgramDef>>,
    },
    /// Result-dependent successor; only meaningful as a `then`
    Branch {
        /// Dotted path into the preceding step's result
        on: String,
        #[serde(default)]
        cases: BTreeMap<String, ProgramDef>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        otherwise: Option<Box<ProgramDef>>,
    },
}

impl ProgramDef {
    /// Build the lazily-unfolding program value
    pub fn compile(&self) -> Program {
        match self {
            ProgramDef::Opaque(raw) => Program::Opaque(raw.clone()),
            ProgramDef::Step(step) => step.compile(),
        }
    }
}

impl StepDef {
    fn compile(&self) -> Program {
        match self {
            StepDef::Done => Program::Done,
            StepDef::Run {
                task_id,
                module,
                then,
            } => Program::Run {
                task_id: task_id.clone(),
                module: module.clone(),
                next: continuation(then.as_deref()),
            },
            StepDef::Sequence { items, then } => Program::Sequence {
                items: items.iter().map(ProgramDef::compile).collect(),
                next: continuation(then.as_deref()),
            },
            StepDef::Parallel { items, then } => Program::Parallel {
                items: items.iter().map(ProgramDef::compile).collect(),
                next: continuation(then.as_deref()),
            },
            StepDef::Unfold { body, then } => Program::Unfold {
                current: Box::new(body.compile()),
                next: continuation(then.as_deref()),
            },
            // No preceding result to branch on outside a `then`
            StepDef::Branch { .. } => {
                Program::Opaque(serde_json::to_value(self).unwrap_or(Value::Null))
            }
        }
    }
}

fn continuation(then: Option<&ProgramDef>) -> Continuation {
    match then {
        None => Continuation::done(),
        Some(ProgramDef::Step(StepDef::Branch {
            on,
            cases,
            otherwise,
        })) => {
            let on = on.clone();
            let cases = cases.clone();
            let otherwise = otherwise.clone();
            Continuation::new(move |result| {
                let selected = lookup(result, &on).ok_or_else(|| ResumeError::NeedsResult {
                    path: on.clone(),
                })?;
                let key = match selected {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                Ok(cases
                    .get(&key)
                    .or(otherwise.as_deref())
                    .map(ProgramDef::compile)
                    .unwrap_or(Program::Done))
            })
        }
        Some(def) => Continuation::then(def.compile()),
    }
}

/// Resolve `a.b.0.c` against a result; `None` for missing or null values
fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.').filter(|s| !s.is_empty() && *s != "$") {
        current = match segment.parse::<usize>() {
            Ok(idx) if current.is_array() => current.get(idx)?,
            _ => current.get(segment)?,
        };
    }
    (!current.is_null()).then_some(current)
}
