//! Shared type definitions for Forge workflows.
//!
//! The [`workflow`] module holds the document model (workflow, stages, steps),
//! the validation rules applied before anything runs, and the run status
//! reported by the engine.

pub mod workflow;

pub use workflow::validation::ValidationError;
pub use workflow::{RunStatus, Stage, Step, StepAction, ValidatedWorkflow, Workflow};
