//! Program stores: workflow id → current program value.
//!
//! Last write wins per id; no versions are exposed. A missing program is
//! `Ok(None)`, not an error.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use super::def::ProgramDef;
use super::value::Program;
use crate::error::{Result, ScopeError};
use crate::ids::validate_workflow_id;

/// Read side of the engine's program store
pub trait ProgramStore: Send + Sync {
    fn get(&self, workflow_id: &str) -> Result<Option<Program>>;
}

/// In-process store (lock-free concurrent access)
#[derive(Clone, Default)]
pub struct MemoryProgramStore {
    programs: Arc<DashMap<String, Program>>,
}

impl MemoryProgramStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the program for `workflow_id`
    pub fn put(&self, workflow_id: impl Into<String>, program: Program) {
        self.programs.insert(workflow_id.into(), program);
    }

    pub fn remove(&self, workflow_id: &str) -> Option<Program> {
        self.programs.remove(workflow_id).map(|(_, p)| p)
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}

impl ProgramStore for MemoryProgramStore {
    fn get(&self, workflow_id: &str) -> Result<Option<Program>> {
        Ok(self.programs.get(workflow_id).map(|p| p.clone()))
    }
}

impl std::fmt::Debug for MemoryProgramStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryProgramStore")
            .field("len", &self.len())
            .finish()
    }
}

/// Directory of `<workflow_id>.yaml` / `.yml` / `.json` program definitions
#[derive(Debug, Clone)]
pub struct DirProgramStore {
    root: PathBuf,
}

const EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

impl DirProgramStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn unavailable(&self, reason: impl Into<String>) -> ScopeError {
        ScopeError::ProgramStoreUnavailable {
            path: self.root.display().to_string(),
            reason: reason.into(),
        }
    }

    /// Parse the stored definition without compiling it
    pub fn definition(&self, workflow_id: &str) -> Result<Option<ProgramDef>> {
        let workflow_id = validate_workflow_id(workflow_id)?;
        if !self.root.is_dir() {
            return Err(self.unavailable("not a directory"));
        }

        for ext in EXTENSIONS {
            let path = self.root.join(format!("{workflow_id}.{ext}"));
            if !path.is_file() {
                continue;
            }
            let text = fs::read_to_string(&path).map_err(|e| self.unavailable(e.to_string()))?;
            // serde_yaml also reads JSON
            let def = serde_yaml::from_str::<ProgramDef>(&text).map_err(|e| {
                ScopeError::ProgramParse {
                    workflow_id: workflow_id.to_string(),
                    details: e.to_string(),
                }
            })?;
            debug!(path = %path.display(), "loaded program definition");
            return Ok(Some(def));
        }
        Ok(None)
    }
}

impl ProgramStore for DirProgramStore {
    fn get(&self, workflow_id: &str) -> Result<Option<Program>> {
        Ok(self.definition(workflow_id)?.map(|def| def.compile()))
    }
}
