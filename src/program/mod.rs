//! Program Module - structure of a workflow, without running it
//!
//! Key types:
//! - `Program`: the engine's lazily-unfolding program value
//! - `ProgramDef`: data-only definition that compiles into a `Program`
//! - `ProgramStore`: workflow id → program (memory / directory)
//! - `ProgramNode`: renderable tree produced by [`walk`]

mod def;
mod node;
mod store;
mod value;
pub mod walker;

pub use def::{ProgramDef, StepDef};
pub use node::ProgramNode;
pub use store::{DirProgramStore, MemoryProgramStore, ProgramStore};
pub use value::{Continuation, Program, ResumeError};
pub use walker::{walk, DEFAULT_MAX_DEPTH, PLACEHOLDER};
