use std::{
    io::{self, Write},
    path::{Path, PathBuf},
    process::ExitCode,
    time::Duration,
};

use anyhow::Result;
use clap::{Parser, Subcommand};
use forge_engine::{DEFAULT_TEMPLATE_FILE, Engine, EngineSettings, load_workflow_file, parse_duration, write_template};
use thiserror::Error;
use tracing::debug;

/// Forge runs declarative workflows made of sequential stages and steps.
#[derive(Debug, Parser)]
#[command(name = "forge", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write an example workflow file
    Init {
        /// Path of the file to create
        #[arg(default_value = DEFAULT_TEMPLATE_FILE)]
        file: PathBuf,
    },

    /// Execute a workflow
    Run {
        /// Workflow file to execute
        workflow: PathBuf,

        /// Deadline for each command ("90", "90s", "10m"); overrides FORGE_COMMAND_TIMEOUT
        #[arg(long, value_parser = parse_duration)]
        timeout: Option<Duration>,
    },

    /// Show what a workflow would do without executing anything
    DryRun {
        /// Workflow file to simulate
        workflow: PathBuf,
    },

    /// Print version and build information
    Version,
}

#[derive(Debug, Error, PartialEq, Eq)]
enum CliError {
    #[error("workflow path cannot be empty")]
    EmptyPath,

    #[error("workflow file not found: {}", .0.display())]
    NotFound(PathBuf),
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match execute(cli.command, &mut io::stdout()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {error}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn execute<W: Write>(command: Command, out: &mut W) -> Result<()> {
    match command {
        Command::Init { file } => init_workflow(&file, out),
        Command::Run { workflow, timeout } => run_workflow(&workflow, timeout, out),
        Command::DryRun { workflow } => dry_run_workflow(&workflow, out),
        Command::Version => print_version(out),
    }
}

fn init_workflow<W: Write>(file: &Path, out: &mut W) -> Result<()> {
    write_template(file)?;
    writeln!(out, "Template workflow file created: {}", file.display())?;
    Ok(())
}

fn run_workflow<W: Write>(path: &Path, timeout: Option<Duration>, out: &mut W) -> Result<()> {
    check_workflow_path(path)?;
    let settings = match timeout {
        Some(timeout) => EngineSettings::default().with_command_timeout(timeout),
        None => EngineSettings::from_env()?,
    };
    debug!(timeout_secs = settings.command_timeout.as_secs(), "resolved engine settings");

    let workflow = load_workflow_file(path)?;
    let mut engine = Engine::builder().settings(settings).output(out).build();
    engine.run(&path.display().to_string(), &workflow)?;
    Ok(())
}

fn dry_run_workflow<W: Write>(path: &Path, out: &mut W) -> Result<()> {
    check_workflow_path(path)?;
    let workflow = load_workflow_file(path)?;
    let mut engine = Engine::builder().output(out).build();
    engine.dry_run(&path.display().to_string(), &workflow)?;
    Ok(())
}

fn print_version<W: Write>(out: &mut W) -> Result<()> {
    writeln!(out, "forge {}", env!("CARGO_PKG_VERSION"))?;
    if let Some(build_date) = option_env!("FORGE_BUILD_DATE") {
        writeln!(out, "Build Date: {build_date}")?;
    }
    if let Some(git_commit) = option_env!("FORGE_GIT_COMMIT") {
        writeln!(out, "Git Commit: {git_commit}")?;
    }
    Ok(())
}

fn check_workflow_path(path: &Path) -> Result<(), CliError> {
    if path.as_os_str().is_empty() {
        return Err(CliError::EmptyPath);
    }
    if !path.exists() {
        return Err(CliError::NotFound(path.to_path_buf()));
    }
    Ok(())
}
