//! Structural validation of workflow documents.
//!
//! Validation is a top-down walk that stops at the first violation found in
//! declaration order. Each level wraps the error of the level below with its
//! own index and name, so the final message names the failing stage and step.

use thiserror::Error;

use super::{Stage, Step, StepAction, Workflow};

/// A violated workflow rule, optionally wrapped with its location.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("workflow name is required")]
    MissingWorkflowName,

    #[error("workflow must have at least one stage")]
    NoStages,

    #[error("stage name is required")]
    MissingStageName,

    #[error("stage must have at least one step")]
    NoSteps,

    #[error("step name is required")]
    MissingStepName,

    #[error("exec step requires 'run' command")]
    MissingRunCommand,

    #[error("sleep step requires positive 'seconds' value")]
    NonPositiveSeconds { seconds: i64 },

    #[error("unknown step type: {type_name}")]
    UnknownStepType { type_name: String },

    #[error("stage {index} ({name}): {source}")]
    Stage {
        index: usize,
        name: String,
        source: Box<ValidationError>,
    },

    #[error("step {index} ({name}): {source}")]
    Step {
        index: usize,
        name: String,
        source: Box<ValidationError>,
    },
}

impl ValidationError {
    /// Returns the innermost rule violation, skipping location wrappers.
    pub fn root_cause(&self) -> &ValidationError {
        match self {
            ValidationError::Stage { source, .. } | ValidationError::Step { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl Workflow {
    /// Validates workflow-level rules, then every stage in order.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::MissingWorkflowName);
        }
        if self.stages.is_empty() {
            return Err(ValidationError::NoStages);
        }

        for (index, stage) in self.stages.iter().enumerate() {
            stage.validate().map_err(|error| ValidationError::Stage {
                index,
                name: stage.name.clone(),
                source: Box::new(error),
            })?;
        }
        Ok(())
    }
}

impl Stage {
    /// Validates the stage name and step list, then every step in order.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::MissingStageName);
        }
        if self.steps.is_empty() {
            return Err(ValidationError::NoSteps);
        }

        for (index, step) in self.steps.iter().enumerate() {
            step.validate().map_err(|error| ValidationError::Step {
                index,
                name: step.name.clone(),
                source: Box::new(error),
            })?;
        }
        Ok(())
    }
}

impl Step {
    /// Validates the step name and the rule of its variant.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.is_empty() {
            return Err(ValidationError::MissingStepName);
        }

        match &self.action {
            StepAction::Exec { run } if run.is_empty() => Err(ValidationError::MissingRunCommand),
            StepAction::Exec { .. } => Ok(()),
            StepAction::Sleep { seconds } if *seconds <= 0 => Err(ValidationError::NonPositiveSeconds { seconds: *seconds }),
            StepAction::Sleep { .. } => Ok(()),
            StepAction::Unsupported { type_name } => Err(ValidationError::UnknownStepType {
                type_name: type_name.clone(),
            }),
        }
    }
}
