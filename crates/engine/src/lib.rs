//! # Forge Engine
//!
//! Loads workflow documents, validates them, and executes or simulates them
//! one step at a time.
//!
//! ## Usage
//!
//! ```rust
//! use forge_engine::{CommandError, Engine, load_workflow_file};
//!
//! let temp_dir = tempfile::tempdir()?;
//! let workflow_path = temp_dir.path().join("workflow.yaml");
//! std::fs::write(&workflow_path, r#"
//! name: demo
//! stages:
//!   - name: build
//!     steps:
//!       - name: compile
//!         type: exec
//!         run: ["cargo", "build"]
//! "#)?;
//!
//! let workflow = load_workflow_file(&workflow_path)?;
//! let mut engine = Engine::builder()
//!     .command_runner(|_argv: &[String]| -> Result<(), CommandError> { Ok(()) })
//!     .output(Vec::new())
//!     .build();
//! engine.dry_run("workflow.yaml", &workflow)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - **`document`**: reading and decoding workflow files
//! - **`executor`**: the engine plus the command and delay capabilities it drives
//! - **`settings`**: environment-backed engine settings
//! - **`template`**: the starter workflow written by `forge init`

pub mod async_runtime;
pub mod document;
pub mod executor;
pub mod settings;
pub mod template;

pub use document::{LoadError, load_workflow_file, parse_workflow};
pub use executor::{
    CommandError, CommandRunner, Delay, Engine, EngineBuilder, ExecutionError, ProcessCommandRunner, StepError, ThreadSleep,
};
pub use settings::{EngineSettings, SettingsError, parse_duration};
pub use template::{DEFAULT_TEMPLATE_FILE, TemplateError, render_template, template_workflow, write_template};
