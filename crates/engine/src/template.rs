//! Starter workflow written by `forge init`.

use std::{
    fs::OpenOptions,
    io::{self, Write},
    path::{Path, PathBuf},
};

use forge_types::{Stage, Step, Workflow};
use thiserror::Error;

/// File name used when `forge init` is given no path.
pub const DEFAULT_TEMPLATE_FILE: &str = "workflow.yaml";

const TEMPLATE_HEADER: &str = "\
# Forge workflow.
#
# Stages run in order; steps inside a stage run in order.
# Step types:
#   exec   run: [program, arg, ...]
#   sleep  seconds: <positive integer>
#
# Try it with `forge dry-run <file>` before `forge run <file>`.
";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("file already exists: {}", .0.display())]
    Exists(PathBuf),

    #[error("failed to write template to {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to render template: {0}")]
    Render(#[from] serde_yaml::Error),
}

/// The example workflow every new project starts from.
pub fn template_workflow() -> Workflow {
    Workflow {
        name: "example-forge-workflow".into(),
        description: Some("Example workflow generated by forge init".into()),
        stages: vec![
            Stage {
                name: "hello-stage".into(),
                steps: vec![
                    Step::exec("hello", ["echo", "Hello from Forge!"]),
                    Step::sleep("pause", 1),
                ],
            },
            Stage {
                name: "goodbye-stage".into(),
                steps: vec![Step::exec("goodbye", ["echo", "Goodbye from Forge!"])],
            },
        ],
    }
}

/// Renders [`template_workflow`] as a commented YAML document.
pub fn render_template() -> Result<String, TemplateError> {
    let body = serde_yaml::to_string(&template_workflow())?;
    Ok(format!("{TEMPLATE_HEADER}\n{body}"))
}

/// Writes the template to `path`. Existing files are never overwritten.
pub fn write_template(path: impl AsRef<Path>) -> Result<(), TemplateError> {
    let path = path.as_ref();
    let rendered = render_template()?;

    let write_error = |source: io::Error| TemplateError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|source| match source.kind() {
            io::ErrorKind::AlreadyExists if !path.is_dir() => TemplateError::Exists(path.to_path_buf()),
            _ => write_error(source),
        })?;
    file.write_all(rendered.as_bytes()).map_err(write_error)?;
    file.flush().map_err(write_error)
}
