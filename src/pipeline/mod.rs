//! Pipeline assembly and execution.
//!
//! The assembler binds each task to exactly one agent and declares the
//! dependency chain from fixed, name-keyed tables; the executor runs the
//! assembled graph to completion and returns the final letter plus the
//! writer's draft.

pub mod assembler;
pub mod executor;

pub use assembler::{Pipeline, assemble};
pub use executor::{Executor, PipelineResult};
