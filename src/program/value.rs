//! The engine's lazily-unfolding program value.
//!
//! Each step exposes what it does now plus a [`Continuation`] that yields the
//! rest of the program once fed the step's result. Structure past a step is
//! only reachable by resuming it.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

/// Why a continuation could not produce its successor
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResumeError {
    #[error("continuation needs a real result at '{path}'")]
    NeedsResult { path: String },

    #[error("continuation failed: {0}")]
    Failed(String),
}

type ResumeFn = dyn Fn(&Value) -> Result<Program, ResumeError> + Send + Sync;

/// Owned, shareable "rest of the program" function
#[derive(Clone)]
pub struct Continuation(Arc<ResumeFn>);

impl Continuation {
    pub fn new<F>(resume: F) -> Self
    where
        F: Fn(&Value) -> Result<Program, ResumeError> + Send + Sync + 'static,
    {
        Self(Arc::new(resume))
    }

    /// Continuation that ends the program
    pub fn done() -> Self {
        Self::then(Program::Done)
    }

    /// Continuation that ignores the result and always goes to `next`
    pub fn then(next: Program) -> Self {
        Self::new(move |_| Ok(next.clone()))
    }

    /// Feed a result and get the successor program
    pub fn resume(&self, result: &Value) -> Result<Program, ResumeError> {
        (self.0)(result)
    }
}

impl fmt::Debug for Continuation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Continuation(..)")
    }
}

/// One step of a program, as inspected
#[derive(Debug, Clone)]
pub enum Program {
    /// Nothing left to do
    Done,
    /// Run one task, then continue
    Run {
        task_id: String,
        module: String,
        next: Continuation,
    },
    /// Run sub-programs in order, then continue
    Sequence {
        items: Vec<Program>,
        next: Continuation,
    },
    /// Run sub-programs concurrently, then continue
    Parallel {
        items: Vec<Program>,
        next: Continuation,
    },
    /// Repeat `current` an engine-decided number of times, then continue
    Unfold {
        current: Box<Program>,
        next: Continuation,
    },
    /// A shape this tool does not understand (kept raw)
    Opaque(Value),
}

impl Program {
    pub fn run(task_id: impl Into<String>, module: impl Into<String>) -> Self {
        Program::Run {
            task_id: task_id.into(),
            module: module.into(),
            next: Continuation::done(),
        }
    }

    pub fn sequence(items: Vec<Program>) -> Self {
        Program::Sequence {
            items,
            next: Continuation::done(),
        }
    }

    pub fn parallel(items: Vec<Program>) -> Self {
        Program::Parallel {
            items,
            next: Continuation::done(),
        }
    }

    pub fn unfold(current: Program) -> Self {
        Program::Unfold {
            current: Box::new(current),
            next: Continuation::done(),
        }
    }

    /// Replace this step's continuation. No-op on `Done` and `Opaque`.
    pub fn with_next(mut self, continuation: Continuation) -> Self {
        match &mut self {
            Program::Run { next, .. }
            | Program::Sequence { next, .. }
            | Program::Parallel { next, .. }
            | Program::Unfold { next, .. } => *next = continuation,
            Program::Done | Program::Opaque(_) => {}
        }
        self
    }

    /// Continue with `next` regardless of this step's result
    pub fn then(self, next: Program) -> Self {
        self.with_next(Continuation::then(next))
    }
}
