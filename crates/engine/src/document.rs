//! Reading workflow documents from disk.

use std::{
    borrow::Cow,
    fs,
    path::{Path, PathBuf},
};

use forge_types::{ValidatedWorkflow, ValidationError, Workflow};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read workflow file {}: {source}", .path.display())]
    Read { path: PathBuf, source: std::io::Error },

    #[error("failed to parse workflow file {}: {source}", .path.display())]
    Parse { path: PathBuf, source: serde_yaml::Error },

    #[error("invalid workflow {}: {source}", .path.display())]
    Invalid { path: PathBuf, source: ValidationError },
}

/// Loads, decodes and validates the workflow at `path`.
pub fn load_workflow_file(path: impl AsRef<Path>) -> Result<ValidatedWorkflow, LoadError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let workflow = parse_workflow(&content).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), workflow = %workflow.name, stages = workflow.stages.len(), "parsed workflow document");

    workflow.into_validated().map_err(|source| LoadError::Invalid {
        path: path.to_path_buf(),
        source,
    })
}

/// Decodes a workflow document without validating it.
///
/// YAML forbids tabs in indentation; leading tabs are expanded to two spaces
/// each so hand-edited documents still load.
pub fn parse_workflow(content: &str) -> Result<Workflow, serde_yaml::Error> {
    serde_yaml::from_str(&expand_leading_tabs(content))
}

fn expand_leading_tabs(content: &str) -> Cow<'_, str> {
    if !content.lines().any(|line| line.starts_with('\t')) {
        return Cow::Borrowed(content);
    }

    let mut expanded = String::with_capacity(content.len());
    for line in content.split_inclusive('\n') {
        let tabs = line.bytes().take_while(|byte| *byte == b'\t').count();
        expanded.push_str(&"  ".repeat(tabs));
        expanded.push_str(&line[tabs..]);
    }
    Cow::Owned(expanded)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use forge_types::{Step, StepAction};
    use tempfile::NamedTempFile;

    use super::*;

    fn write_document(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(content.as_bytes()).expect("write document");
        file
    }

    #[test]
    fn loads_and_validates_a_document() {
        let file = write_document(
            r#"
name: release
stages:
  - name: build
    steps:
      - name: compile
        type: exec
        run: ["cargo", "build", "--release"]
      - name: settle
        type: sleep
        seconds: 1
"#,
        );

        let workflow = load_workflow_file(file.path()).expect("load workflow");
        assert_eq!(workflow.name, "release");
        assert_eq!(workflow.stages[0].steps[0], Step::exec("compile", ["cargo", "build", "--release"]));
        assert_eq!(workflow.stages[0].steps[1].action, StepAction::Sleep { seconds: 1 });
    }

    #[test]
    fn tab_indented_documents_load() {
        let content = "name: tabs\nstages:\n\t- name: only\n\t\tsteps:\n\t\t\t- name: hi\n\t\t\t\ttype: exec\n\t\t\t\trun: [echo, hi]\n";
        let workflow = parse_workflow(content).expect("parse tab-indented workflow");
        assert_eq!(workflow.stages[0].steps[0], Step::exec("hi", ["echo", "hi"]));
    }

    #[test]
    fn only_leading_tabs_are_expanded() {
        assert_eq!(expand_leading_tabs("a:\tb\n\tc: d"), "a:\tb\n  c: d");
        assert!(matches!(expand_leading_tabs("plain: yes"), Cow::Borrowed(_)));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("absent.yaml");
        let error = load_workflow_file(&path).expect_err("read fails");
        assert!(matches!(error, LoadError::Read { .. }));
        assert!(error.to_string().contains("absent.yaml"));
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let file = write_document("name: [unterminated\n");
        let error = load_workflow_file(file.path()).expect_err("parse fails");
        assert!(matches!(error, LoadError::Parse { .. }));
    }

    #[test]
    fn structurally_invalid_workflow_is_rejected() {
        let file = write_document(
            r#"
name: broken
stages:
  - name: build
    steps:
      - name: compile
        type: exec
"#,
        );

        let error = load_workflow_file(file.path()).expect_err("validation fails");
        let LoadError::Invalid { source, .. } = &error else {
            panic!("expected validation error, got {error:?}");
        };
        assert_eq!(source.root_cause(), &ValidationError::MissingRunCommand);
        assert!(
            error
                .to_string()
                .ends_with("stage 0 (build): step 0 (compile): exec step requires 'run' command")
        );
    }
}
