//! Strongly typed workflow schema shared by the loader, the engine, and the CLI.
//!
//! A workflow document is an ordered list of stages, each an ordered list of
//! steps. Authoring order is execution order, so every collection here is a
//! plain `Vec` that preserves the order found in the document.

use std::ops::Deref;

use serde::{Deserialize, Serialize};

pub mod validation;

use validation::ValidationError;

/// Step type tag for steps that run an external command.
pub const STEP_TYPE_EXEC: &str = "exec";
/// Step type tag for steps that pause the run.
pub const STEP_TYPE_SLEEP: &str = "sleep";

/// Top-level named pipeline containing ordered stages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Workflow {
    /// Workflow name shown in progress output. Required.
    #[serde(default)]
    pub name: String,
    /// Optional free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Stages executed in declaration order.
    #[serde(default)]
    pub stages: Vec<Stage>,
}

/// Named, ordered group of steps executed as a unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Stage {
    /// Stage name. Required.
    #[serde(default)]
    pub name: String,
    /// Steps executed in declaration order.
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// Single unit of work inside a stage.
///
/// Documents describe steps with a flat `{name, type, run, seconds}` shape; the
/// `type` tag is folded into [`StepAction`] so each variant only carries the
/// fields it needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "StepDocument", into = "StepDocument")]
pub struct Step {
    /// Step name. Required.
    pub name: String,
    /// What the step does.
    pub action: StepAction,
}

/// The work performed by a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepAction {
    /// Run an external command; `run` is argv (program followed by arguments).
    Exec { run: Vec<String> },
    /// Pause the run for `seconds`.
    Sleep { seconds: i64 },
    /// A `type` tag Forge does not know. Rejected by validation.
    Unsupported { type_name: String },
}

impl StepAction {
    /// Returns the `type` tag as written in a workflow document.
    pub fn type_name(&self) -> &str {
        match self {
            StepAction::Exec { .. } => STEP_TYPE_EXEC,
            StepAction::Sleep { .. } => STEP_TYPE_SLEEP,
            StepAction::Unsupported { type_name } => type_name,
        }
    }
}

impl Step {
    /// Builds an `exec` step from a program and its arguments.
    pub fn exec<I, S>(name: impl Into<String>, run: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            action: StepAction::Exec {
                run: run.into_iter().map(Into::into).collect(),
            },
        }
    }

    /// Builds a `sleep` step.
    pub fn sleep(name: impl Into<String>, seconds: i64) -> Self {
        Self {
            name: name.into(),
            action: StepAction::Sleep { seconds },
        }
    }

    /// Returns the `type` tag of this step.
    pub fn type_name(&self) -> &str {
        self.action.type_name()
    }
}

/// Flat document representation of a step.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StepDocument {
    #[serde(default)]
    name: String,
    #[serde(default, rename = "type")]
    step_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    run: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    seconds: Option<i64>,
}

impl From<StepDocument> for Step {
    fn from(document: StepDocument) -> Self {
        let action = match document.step_type.as_str() {
            STEP_TYPE_EXEC => StepAction::Exec {
                run: document.run.unwrap_or_default(),
            },
            STEP_TYPE_SLEEP => StepAction::Sleep {
                seconds: document.seconds.unwrap_or_default(),
            },
            _ => StepAction::Unsupported {
                type_name: document.step_type,
            },
        };
        Step {
            name: document.name,
            action,
        }
    }
}

impl From<Step> for StepDocument {
    fn from(step: Step) -> Self {
        let step_type = step.type_name().to_string();
        let (run, seconds) = match step.action {
            StepAction::Exec { run } => (Some(run), None),
            StepAction::Sleep { seconds } => (None, Some(seconds)),
            StepAction::Unsupported { .. } => (None, None),
        };
        StepDocument {
            name: step.name,
            step_type,
            run,
            seconds,
        }
    }
}

impl Workflow {
    /// Validates the workflow and wraps it in a [`ValidatedWorkflow`].
    pub fn into_validated(self) -> Result<ValidatedWorkflow, ValidationError> {
        ValidatedWorkflow::try_from(self)
    }
}

/// A workflow that passed [`Workflow::validate`].
///
/// The engine only accepts this type, so nothing can execute a workflow that
/// was not validated first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedWorkflow(Workflow);

impl ValidatedWorkflow {
    /// Returns the underlying workflow.
    pub fn into_inner(self) -> Workflow {
        self.0
    }
}

impl TryFrom<Workflow> for ValidatedWorkflow {
    type Error = ValidationError;

    fn try_from(workflow: Workflow) -> Result<Self, Self::Error> {
        workflow.validate()?;
        Ok(Self(workflow))
    }
}

impl Deref for ValidatedWorkflow {
    type Target = Workflow;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Workflow> for ValidatedWorkflow {
    fn as_ref(&self) -> &Workflow {
        &self.0
    }
}

/// Lifecycle of a single run or dry run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RunStatus {
    /// Nothing has been executed yet.
    #[default]
    Pending,
    /// Executing the given step; both indices are 1-based.
    Running { stage: usize, step: usize },
    /// Every stage finished without error.
    Completed,
    /// A step failed; later steps were not executed.
    Failed { stage: String, step: String, cause: String },
}

impl RunStatus {
    /// Returns true once the run can no longer change state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_exec_and_sleep_steps() {
        let yaml_text = r#"
name: Sample Workflow
description: A sample workflow for testing
stages:
  - name: stage1
    steps:
      - name: step1
        type: exec
        run:
          - echo
          - Hello World
      - name: step2
        type: sleep
        seconds: 2
"#;

        let workflow: Workflow = serde_yaml::from_str(yaml_text).expect("deserialize workflow");

        assert_eq!(workflow.name, "Sample Workflow");
        assert_eq!(workflow.description.as_deref(), Some("A sample workflow for testing"));
        assert_eq!(workflow.stages.len(), 1);
        let steps = &workflow.stages[0].steps;
        assert_eq!(steps[0], Step::exec("step1", ["echo", "Hello World"]));
        assert_eq!(steps[1], Step::sleep("step2", 2));
    }

    #[test]
    fn unknown_type_is_kept_for_validation() {
        let yaml_text = r#"
name: step
type: deploy
run: ["make"]
"#;
        let step: Step = serde_yaml::from_str(yaml_text).expect("deserialize step");
        assert_eq!(
            step.action,
            StepAction::Unsupported {
                type_name: "deploy".into()
            }
        );
        assert_eq!(step.type_name(), "deploy");
    }

    #[test]
    fn missing_fields_decode_to_empty_values() {
        let yaml_text = r#"
stages:
  - steps:
      - type: exec
      - type: sleep
"#;
        let workflow: Workflow = serde_yaml::from_str(yaml_text).expect("deserialize workflow");
        assert!(workflow.name.is_empty());
        let steps = &workflow.stages[0].steps;
        assert_eq!(steps[0].action, StepAction::Exec { run: Vec::new() });
        assert_eq!(steps[1].action, StepAction::Sleep { seconds: 0 });
    }

    #[test]
    fn serializes_only_the_fields_of_the_variant() {
        let text = serde_yaml::to_string(&Step::sleep("nap", 3)).expect("serialize step");
        assert!(text.contains("type: sleep"));
        assert!(text.contains("seconds: 3"));
        assert!(!text.contains("run"));

        let text = serde_yaml::to_string(&Step::exec("build", ["cargo", "build"])).expect("serialize step");
        assert!(text.contains("type: exec"));
        assert!(!text.contains("seconds"));
    }

    #[test]
    fn repository_sample_workflow_parses() {
        let yaml_text = include_str!("../../../workflows/build-and-test.yaml");
        let workflow: Workflow = serde_yaml::from_str(yaml_text).expect("parse sample workflow");
        assert_eq!(workflow.name, "build-and-test");
        assert_eq!(workflow.stages.len(), 2);
        assert!(workflow.into_validated().is_ok());
    }

    #[test]
    fn validated_workflow_rejects_invalid_input() {
        let workflow = Workflow {
            name: String::new(),
            description: None,
            stages: Vec::new(),
        };
        assert_eq!(
            ValidatedWorkflow::try_from(workflow),
            Err(ValidationError::MissingWorkflowName)
        );
    }

    #[test]
    fn run_status_terminal_states() {
        assert!(!RunStatus::Pending.is_terminal());
        assert!(!RunStatus::Running { stage: 1, step: 1 }.is_terminal());
        assert!(RunStatus::Completed.is_terminal());
        assert!(
            RunStatus::Failed {
                stage: "build".into(),
                step: "compile".into(),
                cause: "boom".into()
            }
            .is_terminal()
        );
    }
}
