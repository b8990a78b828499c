use std::{
    cell::RefCell,
    fs,
    rc::Rc,
    time::Duration,
};

use forge_engine::{CommandError, Engine, load_workflow_file};
use forge_types::{RunStatus, Stage, Step, ValidatedWorkflow, Workflow};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Exec(Vec<String>),
    Delay(Duration),
}

fn build_and_test() -> ValidatedWorkflow {
    Workflow {
        name: "ci".into(),
        description: None,
        stages: vec![
            Stage {
                name: "build".into(),
                steps: vec![Step::exec("compile", ["go", "build"]), Step::sleep("wait", 2)],
            },
            Stage {
                name: "test".into(),
                steps: vec![Step::exec("unit", ["go", "test"])],
            },
        ],
    }
    .into_validated()
    .expect("valid workflow")
}

fn recording_engine(calls: &Rc<RefCell<Vec<Call>>>) -> Engine<Vec<u8>> {
    let exec_calls = Rc::clone(calls);
    let delay_calls = Rc::clone(calls);
    Engine::builder()
        .command_runner(move |argv: &[String]| -> Result<(), CommandError> {
            exec_calls.borrow_mut().push(Call::Exec(argv.to_vec()));
            Ok(())
        })
        .delay(move |duration: Duration| delay_calls.borrow_mut().push(Call::Delay(duration)))
        .output(Vec::new())
        .build()
}

fn position(haystack: &str, needle: &str) -> usize {
    haystack
        .find(needle)
        .unwrap_or_else(|| panic!("missing '{needle}' in output:\n{haystack}"))
}

#[test]
fn run_invokes_capabilities_in_declaration_order() {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let mut engine = recording_engine(&calls);

    engine.run("ci.yaml", &build_and_test()).expect("run succeeds");

    assert_eq!(
        *calls.borrow(),
        vec![
            Call::Exec(vec!["go".into(), "build".into()]),
            Call::Delay(Duration::from_secs(2)),
            Call::Exec(vec!["go".into(), "test".into()]),
        ]
    );
    assert_eq!(engine.status(), &RunStatus::Completed);

    let output = String::from_utf8(engine.into_output()).expect("utf-8 output");
    let stage_one = position(&output, "STAGE 1: build");
    let stage_two = position(&output, "STAGE 2: test");
    let done = position(&output, "✓ Workflow execution completed.");
    assert!(stage_one < stage_two && stage_two < done);
}

#[test]
fn dry_run_describes_every_step_without_side_effects() {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let mut engine = recording_engine(&calls);

    engine.dry_run("ci.yaml", &build_and_test()).expect("dry run succeeds");

    assert!(calls.borrow().is_empty());
    let output = String::from_utf8(engine.into_output()).expect("utf-8 output");
    assert_eq!(output.matches("Would execute command").count(), 2);
    assert_eq!(output.matches("Would sleep").count(), 1);
    assert!(output.lines().filter(|line| !line.is_empty()).all(|line| line.starts_with("[DRY-RUN] ")));
}

#[test]
fn loaded_document_runs_end_to_end() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("ci.yaml");
    fs::write(
        &path,
        r#"
name: ci
stages:
  - name: build
    steps:
      - name: compile
        type: exec
        run: ["go", "build"]
      - name: wait
        type: sleep
        seconds: 2
  - name: test
    steps:
      - name: unit
        type: exec
        run: ["go", "test"]
"#,
    )
    .expect("write workflow");

    let workflow = load_workflow_file(&path).expect("load workflow");
    assert_eq!(workflow, build_and_test());

    let calls = Rc::new(RefCell::new(Vec::new()));
    let mut engine = recording_engine(&calls);
    engine.run(&path.display().to_string(), &workflow).expect("run succeeds");
    assert_eq!(calls.borrow().len(), 3);
}

#[cfg(unix)]
#[tokio::test]
async fn default_runner_works_inside_current_thread_runtime() {
    let workflow = Workflow {
        name: "async-host".into(),
        description: None,
        stages: vec![Stage {
            name: "check".into(),
            steps: vec![Step::exec("truth", ["true"])],
        }],
    }
    .into_validated()
    .expect("valid workflow");

    let mut engine = Engine::builder().output(Vec::new()).build();
    engine.run("ci.yaml", &workflow).expect("run succeeds");
    assert_eq!(engine.status(), &RunStatus::Completed);
}
