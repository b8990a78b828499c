//! Errors raised while walking a workflow.

use std::io;

use thiserror::Error;

use super::runner::CommandError;

/// Failure of one step, before the engine adds its location.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("command execution failed: {0}")]
    Command(#[source] CommandError),

    #[error("unknown step type: {0}")]
    UnknownStepType(String),
}

/// Error returned by [`Engine::run`](super::Engine::run) and
/// [`Engine::dry_run`](super::Engine::dry_run).
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("stage '{stage}', step '{step}': {source}")]
    Step { stage: String, step: String, source: StepError },

    #[error("failed to write progress output: {0}")]
    Output(#[from] io::Error),
}

impl ExecutionError {
    /// Returns the failing stage and step names, if a step failed.
    pub fn location(&self) -> Option<(&str, &str)> {
        match self {
            ExecutionError::Step { stage, step, .. } => Some((stage, step)),
            ExecutionError::Output(_) => None,
        }
    }
}
