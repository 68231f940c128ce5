//! End-to-end tests against the real subprocess driver.
//!
//! A shell script stands in for the solver executable: it drains the input
//! channel like dlvhex2 would, prints canned answer-set lines, and honors the
//! wait-for-newline handshake between answer sets. This exercises the full
//! pipeline (fact generation, capture rules, IPC channel, line protocol,
//! process termination) without requiring a solver installation.
#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use sesh::{Dlvhex2Solver, Program, SeshError, SolverError, Value};

/// Write an executable fake-solver script. The preamble locates the input
/// channel (the first non-flag argument) in `$input` and drains it.
fn fake_solver(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("fake-dlvhex2");
    let script = format!(
        "#!/bin/sh\n\
         for a in \"$@\"; do case \"$a\" in --*) ;; *) input=\"$a\"; break ;; esac; done\n\
         cat \"$input\" > /dev/null\n\
         {body}\n"
    );
    std::fs::write(&path, script).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

fn sequence_program(solver_path: &Path) -> Program {
    let mut program = Program::from_code(
        r#"
        %! INPUT (names) { name(n) for (_, n) in names; }
        p(X, I) :- position(X, I).
        %! OUTPUT { order = sequence { query: p(X, I); content: X; index: I; }; }
        "#,
    )
    .unwrap();
    program.set_solver(Dlvhex2Solver::with_executable(solver_path));
    program
}

fn names() -> Value {
    Value::Seq(vec![Value::Str("abc".into()), Value::Str("def".into())])
}

#[test]
fn resolves_a_sequence_from_captured_tuples() {
    let dir = tempfile::TempDir::new().unwrap();
    let solver = fake_solver(
        dir.path(),
        "echo '{sesh__0(abc,1), sesh__0(def,0), sesh__0(xyz,2)}'",
    );
    let program = sequence_program(&solver);

    let model = program.solve_one(&[names()], None).unwrap().unwrap();
    assert_eq!(
        model.get("order").unwrap(),
        Value::Seq(vec![
            Value::Sym("def".into()),
            Value::Sym("abc".into()),
            Value::Sym("xyz".into()),
        ])
    );
}

#[test]
fn pulls_answer_sets_through_the_handshake() {
    let dir = tempfile::TempDir::new().unwrap();
    // The script blocks between answer sets until the driver acknowledges
    // with a newline; the test would hang if the handshake were missing.
    let solver = fake_solver(
        dir.path(),
        "echo '{sesh__0(a,0)}'\n\
         read _ack\n\
         echo '{sesh__0(b,0)}'",
    );
    let program = sequence_program(&solver);

    let mut results = program.solve(&[names()], None, true).unwrap();
    let models: Vec<_> = results.iter().collect();
    assert_eq!(models.len(), 2);
    for model in models {
        let value = model.unwrap().get("order").unwrap();
        assert!(matches!(value, Value::Seq(items) if items.len() == 1));
    }
    results.close().unwrap();
}

#[test]
fn solver_failure_carries_exit_code_and_stderr() {
    let dir = tempfile::TempDir::new().unwrap();
    let solver = fake_solver(
        dir.path(),
        "echo 'input rule violation' >&2\n\
         exit 7",
    );
    let program = sequence_program(&solver);

    let mut results = program.solve(&[names()], None, false).unwrap();
    let first = results.iter().next().unwrap();
    match first {
        Err(SeshError::Solver(SolverError::Subprocess { code, stderr })) => {
            assert_eq!(code, 7);
            assert!(stderr.contains("input rule violation"));
        }
        other => panic!("expected a subprocess error, got {other:?}"),
    }
    // The error is reported once; closing afterwards is clean.
    results.close().unwrap();
}

#[test]
fn abandoning_results_terminates_the_solver_cleanly() {
    let dir = tempfile::TempDir::new().unwrap();
    let solver = fake_solver(
        dir.path(),
        "echo '{sesh__0(a,0)}'\n\
         read _ack\n\
         sleep 30",
    );
    let program = sequence_program(&solver);

    let mut results = program.solve(&[names()], None, false).unwrap();
    assert!(results.iter().next().unwrap().is_ok());
    // Driver-initiated termination of the still-running solver is benign.
    results.close().unwrap();
}

#[test]
fn malformed_solver_output_is_a_wire_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let solver = fake_solver(dir.path(), "echo 'this is not an answer set'");
    let program = sequence_program(&solver);

    let mut results = program.solve(&[names()], None, false).unwrap();
    let first = results.iter().next().unwrap();
    assert!(matches!(
        first,
        Err(SeshError::Solver(SolverError::Wire { ref line })) if line.contains("not an answer set")
    ));
}

#[test]
fn generated_program_reaches_the_solver() {
    let dir = tempfile::TempDir::new().unwrap();
    let copy = dir.path().join("received.lp");
    // A custom script: drain the input channel into a file instead of
    // discarding it, so the generated program can be inspected. The channel
    // must be opened exactly once.
    let path = dir.path().join("copying-solver");
    let script = format!(
        "#!/bin/sh\n\
         for a in \"$@\"; do case \"$a\" in --*) ;; *) input=\"$a\"; break ;; esac; done\n\
         cat \"$input\" > '{}'\n\
         echo '{{}}'\n",
        copy.display()
    );
    std::fs::write(&path, script).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();

    let program = sequence_program(&path);
    let _ = program.solve_one(&[names()], None).unwrap();

    let text = std::fs::read_to_string(&copy).unwrap();
    assert!(text.contains("name(\"abc\").\nname(\"def\").\n"));
    assert!(text.contains("sesh__0(X,I) :- p(X,I)."));
    assert!(text.contains("p(X, I) :- position(X, I)."));
}

#[test]
fn missing_executable_is_a_spawn_error() {
    let mut program = Program::from_code("p(a).").unwrap();
    program.set_solver(Dlvhex2Solver::with_executable(
        "/nonexistent/sesh-no-such-solver",
    ));
    let err = program.solve(&[], None, false).unwrap_err();
    assert!(matches!(
        err,
        SeshError::Solver(SolverError::Spawn { .. })
    ));
}
