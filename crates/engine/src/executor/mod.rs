//! Execution engine: walks a validated workflow stage by stage, step by step,
//! and either drives the injected capabilities or reports what it would do.
//!
//! - `runner::CommandRunner` abstracts how an `exec` step's argv is executed
//! - `runner::ProcessCommandRunner` spawns child processes with a deadline
//! - `delay::Delay` abstracts the blocking wait behind `sleep` steps
//! - [`Engine::run`] and [`Engine::dry_run`] share one traversal and differ only
//!   in whether those capabilities are invoked

use std::{
    io::{self, Write},
    time::Duration,
};

use forge_types::{RunStatus, Stage, Step, StepAction, ValidatedWorkflow};
use tracing::{debug, info, warn};

use crate::settings::EngineSettings;

pub mod delay;
pub mod error;
pub mod runner;

pub use delay::{Delay, ThreadSleep};
pub use error::{ExecutionError, StepError};
pub use runner::{CommandError, CommandRunner, ProcessCommandRunner};

const DRY_RUN_PREFIX: &str = "[DRY-RUN] ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Execute,
    Simulate,
}

impl Mode {
    fn prefix(self) -> &'static str {
        match self {
            Mode::Execute => "",
            Mode::Simulate => DRY_RUN_PREFIX,
        }
    }
}

/// Sequential workflow engine.
///
/// Capabilities are fixed when the engine is built; see [`EngineBuilder`].
/// Progress lines are written to the output sink in strict call order.
pub struct Engine<W = io::Stdout> {
    commands: Box<dyn CommandRunner>,
    delay: Box<dyn Delay>,
    output: W,
    status: RunStatus,
}

impl Engine {
    /// Start configuring an engine. Unset capabilities fall back to a
    /// [`ProcessCommandRunner`], [`ThreadSleep`], and stdout.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

impl<W: Write> Engine<W> {
    /// Execute every step in declaration order, aborting on the first failure.
    ///
    /// Steps that already ran keep their side effects; nothing is rolled back.
    pub fn run(&mut self, source: &str, workflow: &ValidatedWorkflow) -> Result<(), ExecutionError> {
        self.walk(source, workflow, Mode::Execute)
    }

    /// Walk the workflow exactly like [`Engine::run`] without invoking the
    /// command runner or the delay.
    pub fn dry_run(&mut self, source: &str, workflow: &ValidatedWorkflow) -> Result<(), ExecutionError> {
        self.walk(source, workflow, Mode::Simulate)
    }

    /// Status of the most recent run or dry run.
    pub fn status(&self) -> &RunStatus {
        &self.status
    }

    /// The progress sink.
    pub fn output(&self) -> &W {
        &self.output
    }

    /// Consumes the engine and returns the progress sink.
    pub fn into_output(self) -> W {
        self.output
    }

    fn walk(&mut self, source: &str, workflow: &ValidatedWorkflow, mode: Mode) -> Result<(), ExecutionError> {
        self.status = RunStatus::Pending;
        let result = self.traverse(source, workflow, mode);
        if let Err(ExecutionError::Output(error)) = &result {
            warn!(%error, "failed to write progress output; aborting workflow");
            let location = match &self.status {
                RunStatus::Running { stage, step } => workflow
                    .stages
                    .get(stage - 1)
                    .and_then(|current| Some((current.name.clone(), current.steps.get(step - 1)?.name.clone()))),
                _ => None,
            };
            let (stage, step) = location.unwrap_or_default();
            self.status = RunStatus::Failed {
                stage,
                step,
                cause: error.to_string(),
            };
        }
        result
    }

    fn traverse(&mut self, source: &str, workflow: &ValidatedWorkflow, mode: Mode) -> Result<(), ExecutionError> {
        let prefix = mode.prefix();
        let dry_run = mode == Mode::Simulate;

        match mode {
            Mode::Execute => writeln!(self.output, "Executing workflow: {source}")?,
            Mode::Simulate => writeln!(self.output, "{prefix}Would execute workflow: {source}")?,
        }
        info!(workflow = %workflow.name, source = %source, dry_run, stages = workflow.stages.len(), "starting workflow");

        for (stage_index, stage) in workflow.stages.iter().enumerate() {
            let stage_number = stage_index + 1;
            writeln!(self.output, "\n{prefix}=== STAGE {stage_number}: {} ===", stage.name)?;

            for (step_index, step) in stage.steps.iter().enumerate() {
                let step_number = step_index + 1;
                self.status = RunStatus::Running {
                    stage: stage_number,
                    step: step_number,
                };
                writeln!(
                    self.output,
                    "{prefix}STEP {stage_number}.{step_number}: {} ({})",
                    step.name,
                    step.type_name()
                )?;
                debug!(stage = %stage.name, step = %step.name, step_type = step.type_name(), dry_run, "dispatching step");
                self.dispatch(stage, step, mode)?;
            }

            writeln!(self.output, "{prefix}=== STAGE {stage_number} COMPLETED ===")?;
        }

        match mode {
            Mode::Execute => writeln!(self.output, "\n✓ Workflow execution completed.")?,
            Mode::Simulate => writeln!(self.output, "\n{prefix}✓ Workflow simulation completed.")?,
        }
        self.status = RunStatus::Completed;
        info!(workflow = %workflow.name, dry_run, "workflow completed");
        Ok(())
    }

    fn dispatch(&mut self, stage: &Stage, step: &Step, mode: Mode) -> Result<(), ExecutionError> {
        match (&step.action, mode) {
            (StepAction::Exec { run }, Mode::Execute) => self
                .commands
                .run(run)
                .map_err(|error| self.fail(stage, step, StepError::Command(error))),
            (StepAction::Exec { run }, Mode::Simulate) => {
                writeln!(self.output, "{DRY_RUN_PREFIX}  Would execute command: [{}]", run.join(" "))?;
                Ok(())
            }
            (StepAction::Sleep { seconds }, Mode::Execute) => {
                writeln!(self.output, "  Sleeping for {seconds} seconds...")?;
                self.output.flush()?;
                self.delay.wait(Duration::from_secs(seconds.unsigned_abs()));
                Ok(())
            }
            (StepAction::Sleep { seconds }, Mode::Simulate) => {
                writeln!(self.output, "{DRY_RUN_PREFIX}  Would sleep for {seconds} seconds")?;
                Ok(())
            }
            // Validation rejects these; reaching here means a validation bypass.
            (StepAction::Unsupported { type_name }, _) => Err(self.fail(stage, step, StepError::UnknownStepType(type_name.clone()))),
        }
    }

    fn fail(&mut self, stage: &Stage, step: &Step, source: StepError) -> ExecutionError {
        warn!(stage = %stage.name, step = %step.name, error = %source, "step failed; aborting workflow");
        self.status = RunStatus::Failed {
            stage: stage.name.clone(),
            step: step.name.clone(),
            cause: source.to_string(),
        };
        ExecutionError::Step {
            stage: stage.name.clone(),
            step: step.name.clone(),
            source,
        }
    }
}

/// Explicit configuration for an [`Engine`].
pub struct EngineBuilder<W = io::Stdout> {
    settings: EngineSettings,
    commands: Option<Box<dyn CommandRunner>>,
    delay: Option<Box<dyn Delay>>,
    output: W,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            settings: EngineSettings::default(),
            commands: None,
            delay: None,
            output: io::stdout(),
        }
    }
}

impl<W: Write> EngineBuilder<W> {
    /// Settings used for the default command runner.
    pub fn settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Runner for `exec` steps.
    pub fn command_runner(mut self, runner: impl CommandRunner + 'static) -> Self {
        self.commands = Some(Box::new(runner));
        self
    }

    /// Wait used by `sleep` steps.
    pub fn delay(mut self, delay: impl Delay + 'static) -> Self {
        self.delay = Some(Box::new(delay));
        self
    }

    /// Replace the progress sink.
    pub fn output<O: Write>(self, output: O) -> EngineBuilder<O> {
        EngineBuilder {
            settings: self.settings,
            commands: self.commands,
            delay: self.delay,
            output,
        }
    }

    /// Builds the engine, filling in defaults for unset capabilities.
    pub fn build(self) -> Engine<W> {
        let timeout = self.settings.command_timeout;
        Engine {
            commands: self.commands.unwrap_or_else(|| Box::new(ProcessCommandRunner::new(timeout))),
            delay: self.delay.unwrap_or_else(|| Box::new(ThreadSleep)),
            output: self.output,
            status: RunStatus::Pending,
        }
    }
}
