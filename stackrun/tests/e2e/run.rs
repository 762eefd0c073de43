//! `run` failure policies and output

use serial_test::serial;

use super::helpers::{build_tree, resolved, sp, Sandbox};
use stackrun::commands::run::{self, RunArgs, RunOutput};
use stackrun::commands::Project;
use stackrun::exec::{Interrupt, Outcome, RunReport};
use stackrun::{exit_codes, RunError};

const CHECK_SCRIPT: &str = "echo checked; test -e ok";

/// Succeeds only in stacks holding an `ok` marker file
fn marker_check() -> Vec<String> {
    ["sh", "-c", CHECK_SCRIPT]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

struct Captured {
    result: anyhow::Result<RunReport>,
    out: String,
    err: String,
}

fn run_in(project: &Project, args: RunArgs) -> Captured {
    colored::control::set_override(false);
    let mut out = Vec::new();
    let mut err = Vec::new();
    let result = run::execute(
        project,
        &args,
        None,
        Interrupt::new(),
        RunOutput {
            out: &mut out,
            err: &mut err,
        },
    );
    Captured {
        result,
        out: String::from_utf8(out).unwrap(),
        err: String::from_utf8(err).unwrap(),
    }
}

fn failing_layout() -> Sandbox {
    let sandbox = Sandbox::new();
    build_tree(&sandbox, &["s:a", "f:a/ok:", "s:b", "s:c", "f:c/ok:"]);
    sandbox
}

#[test]
#[serial]
fn test_halt_on_first_failure() {
    let sandbox = failing_layout();
    let project = sandbox.project_at("");

    let captured = run_in(
        &project,
        RunArgs {
            command: marker_check(),
            ..RunArgs::default()
        },
    );

    let header = format!("{} -c '{CHECK_SCRIPT}'", resolved("sh"));
    assert_eq!(
        captured.out,
        format!("[a] running {header}\nchecked\n[b] running {header}\nchecked\n")
    );
    assert!(captured.err.contains("failed b: exit code 1"), "{}", captured.err);
    assert!(captured.err.contains("skipped c"), "{}", captured.err);

    let err = captured.result.unwrap_err();
    assert_eq!(exit_codes::for_error(&err), exit_codes::STACK_FAILED);
    match err.downcast::<RunError>().unwrap() {
        RunError::Aggregate {
            failed,
            total,
            stacks,
        } => {
            assert_eq!((failed, total), (1, 3));
            assert_eq!(stacks, vec![sp("/b")]);
        }
        other => panic!("expected aggregate, got {other:?}"),
    }
}

#[test]
#[serial]
fn test_continue_on_error_attempts_everything() {
    let sandbox = failing_layout();
    let project = sandbox.project_at("");

    let captured = run_in(
        &project,
        RunArgs {
            continue_on_error: true,
            command: marker_check(),
            ..RunArgs::default()
        },
    );

    assert_eq!(captured.out.matches("checked\n").count(), 3);
    assert!(captured.out.contains("[c] running"));
    let err = captured.result.unwrap_err();
    assert_eq!(err.to_string(), "1 of 3 stacks failed: /b");
}

#[test]
#[serial]
fn test_continue_on_error_from_config() {
    let sandbox = failing_layout();
    sandbox.write_file("stackrun.toml", "[run]\ncontinue_on_error = true\n");
    let project = sandbox.project_at("");

    let captured = run_in(
        &project,
        RunArgs {
            command: marker_check(),
            ..RunArgs::default()
        },
    );
    assert!(captured.out.contains("[c] running"));
    assert!(captured.result.is_err());
}

#[test]
#[serial]
fn test_success_reports_every_stack() {
    let sandbox = Sandbox::new();
    build_tree(&sandbox, &["s:a", "s:b:after=[/a]"]);
    let project = sandbox.project_at("");

    let captured = run_in(
        &project,
        RunArgs {
            command: vec!["pwd".to_string()],
            ..RunArgs::default()
        },
    );
    let report = captured.result.unwrap();
    assert!(report.is_success());
    assert_eq!(report.outcomes.len(), 2);
    assert!(report.outcomes.iter().all(|o| o.outcome == Outcome::Succeeded));
    assert!(report.outcomes[0].stdout.trim_end().ends_with("/a"));
    assert!(report.outcomes[1].stdout.trim_end().ends_with("/b"));
    assert!(captured.err.contains("2 succeeded, 0 failed"));
}

#[test]
#[serial]
fn test_dry_run_runs_nothing() {
    let sandbox = failing_layout();
    let project = sandbox.project_at("");

    let captured = run_in(
        &project,
        RunArgs {
            dry_run: true,
            command: vec!["touch".to_string(), "ran".to_string()],
            ..RunArgs::default()
        },
    );

    let touch = resolved("touch");
    assert_eq!(
        captured.out,
        format!("[a] would run {touch} ran\n[b] would run {touch} ran\n[c] would run {touch} ran\n")
    );
    assert!(captured.result.is_ok());
    assert!(!sandbox.root().join("a/ran").exists());
}

#[test]
#[serial]
fn test_timeout_fails_the_stack() {
    let sandbox = Sandbox::new();
    build_tree(&sandbox, &["s:slow"]);
    let project = sandbox.project_at("");

    let captured = run_in(
        &project,
        RunArgs {
            timeout_secs: Some(1),
            command: vec!["sleep".to_string(), "30".to_string()],
            ..RunArgs::default()
        },
    );
    assert!(captured.err.contains("failed slow: timed out"), "{}", captured.err);
    assert!(captured.result.is_err());
}

#[test]
fn test_unknown_command_fails_before_running() {
    let sandbox = Sandbox::new();
    build_tree(&sandbox, &["s:a"]);
    let project = sandbox.project_at("");

    let captured = run_in(
        &project,
        RunArgs {
            command: vec!["no-such-program-for-stackrun".to_string()],
            ..RunArgs::default()
        },
    );
    let err = captured.result.unwrap_err();
    assert_eq!(exit_codes::for_error(&err), exit_codes::INVALID);
    assert!(captured.out.is_empty());
}
