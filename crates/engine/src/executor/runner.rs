use std::{io, process::ExitStatus, process::Stdio, time::Duration};

use thiserror::Error;
use tracing::{debug, warn};

use crate::async_runtime::block_on_future;

/// Failure of a single command invocation.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("no command given")]
    EmptyCommand,

    #[error("failed to start '{program}': {source}")]
    Spawn { program: String, source: io::Error },

    #[error("'{program}' failed while running: {source}")]
    Wait { program: String, source: io::Error },

    #[error("'{program}' exited with {status}")]
    Exit { program: String, status: ExitStatus },

    #[error("'{program}' timed out after {timeout:?}")]
    TimedOut { program: String, timeout: Duration },

    #[error("could not start the process runtime: {0}")]
    Runtime(#[source] io::Error),
}

/// Execute a single command.
///
/// The engine hands over argv exactly as declared in the workflow: the program
/// followed by its arguments. Implementations block until the command is done.
pub trait CommandRunner {
    /// Run `argv` to completion; any non-success outcome is an error.
    fn run(&self, argv: &[String]) -> Result<(), CommandError>;
}

impl<F> CommandRunner for F
where
    F: Fn(&[String]) -> Result<(), CommandError>,
{
    fn run(&self, argv: &[String]) -> Result<(), CommandError> {
        self(argv)
    }
}

/// Runs commands as child processes that inherit the caller's standard streams.
///
/// Each command is bound to `timeout`; when the deadline passes the child is
/// killed and the step fails with [`CommandError::TimedOut`].
#[derive(Debug, Clone)]
pub struct ProcessCommandRunner {
    timeout: Duration,
}

impl ProcessCommandRunner {
    /// Create a runner with the given per-command deadline.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl CommandRunner for ProcessCommandRunner {
    fn run(&self, argv: &[String]) -> Result<(), CommandError> {
        let (program, args) = argv.split_first().ok_or(CommandError::EmptyCommand)?;
        debug!(program = %program, args = ?args, timeout_secs = self.timeout.as_secs(), "spawning command");

        let program = program.clone();
        let args = args.to_vec();
        let timeout = self.timeout;
        block_on_future(run_with_deadline(program, args, timeout)).map_err(CommandError::Runtime)?
    }
}

async fn run_with_deadline(program: String, args: Vec<String>, timeout: Duration) -> Result<(), CommandError> {
    let mut child = tokio::process::Command::new(&program)
        .args(&args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| CommandError::Spawn {
            program: program.clone(),
            source,
        })?;

    match tokio::time::timeout(timeout, child.wait()).await {
        Ok(Ok(status)) if status.success() => Ok(()),
        Ok(Ok(status)) => Err(CommandError::Exit { program, status }),
        Ok(Err(source)) => Err(CommandError::Wait { program, source }),
        Err(_) => {
            warn!(program = %program, timeout = ?timeout, "command exceeded its deadline; killing it");
            if let Err(error) = child.kill().await {
                warn!(program = %program, %error, "failed to kill timed out command");
            }
            Err(CommandError::TimedOut { program, timeout })
        }
    }
}
