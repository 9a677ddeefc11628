// Regression tests for the tally binary: exit codes, stdout values and
// miette diagnostics on stderr.

use std::fs;

use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};

fn tally() -> Command {
    Command::cargo_bin("tally").unwrap()
}

#[test]
fn prompt_mode_reads_one_line_from_stdin() {
    tally()
        .write_stdin("(1*(-2))*(-2)-1*(2+4*2)/3+1\n")
        .assert()
        .success()
        .stdout(contains("Result: 2"));
}

#[test]
fn prompt_mode_reports_invalid_characters() {
    tally()
        .write_stdin("1 + 2\n")
        .assert()
        .failure()
        .stdout(contains("Result").not())
        .stderr(contains("tally::validation::invalid_character"));
}

#[test]
fn eval_prints_one_value_per_expression() {
    tally()
        .args(["eval", "1+2", "-1*-4", "(1+3*(-4))/2"])
        .assert()
        .success()
        .stdout("3\n4\n-5\n");
}

#[test]
fn division_by_zero_fails_with_diagnostic() {
    tally()
        .args(["eval", "8/(2-2)"])
        .assert()
        .failure()
        .stderr(contains("tally::eval::division_by_zero").and(contains("Division by zero")));
}

#[test]
fn lenient_flag_restores_legacy_behaviour() {
    tally()
        .args(["eval", "(1+2"])
        .assert()
        .failure()
        .stderr(contains("unbalanced_parenthesis"));

    tally()
        .args(["--lenient", "eval", "(1+2"])
        .assert()
        .success()
        .stdout("3\n");
}

#[test]
fn config_file_sets_the_mode() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("tally.yaml");
    fs::write(&config, "strictness: lenient\nmax_depth: 16\n").unwrap();

    tally()
        .arg("--config")
        .arg(&config)
        .args(["eval", "1+"])
        .assert()
        .success()
        .stdout("1\n");
}

#[test]
fn bad_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("tally.yaml");
    fs::write(&config, "max_depth: 0\n").unwrap();

    tally()
        .arg("--config")
        .arg(&config)
        .args(["eval", "1"])
        .assert()
        .failure()
        .stderr(contains("max_depth must be at least 1"));
}

#[test]
fn run_evaluates_each_line_and_fails_if_any_line_fails() {
    let dir = tempfile::tempdir().unwrap();
    let batch = dir.path().join("batch.txt");
    fs::write(&batch, "1+2\n\n4*4-3*2\n1/0\n").unwrap();

    tally()
        .arg("run")
        .arg(&batch)
        .assert()
        .failure()
        .stdout(contains("1+2 = 3").and(contains("4*4-3*2 = 10")))
        .stderr(contains("division_by_zero"));
}

#[test]
fn run_reports_missing_files() {
    tally()
        .args(["run", "does/not/exist.txt"])
        .assert()
        .failure()
        .stderr(contains("failed to read"));
}

#[test]
fn builtin_self_check_passes() {
    tally()
        .arg("test")
        .assert()
        .success()
        .stdout(contains("0 failed"));
}

#[test]
fn yaml_suite_failures_set_the_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    let suite = dir.path().join("suite.yaml");
    fs::write(
        &suite,
        "- {name: sum, input: '1+2', expected: 3}\n- {name: off by one, input: '2*2', expected: 5}\n",
    )
    .unwrap();

    tally()
        .arg("test")
        .arg(&suite)
        .assert()
        .failure()
        .stdout(contains("off by one: expected 5, got 4").and(contains("1 passed, 1 failed")));
}

#[test]
fn repl_reads_until_quit() {
    tally()
        .arg("repl")
        .write_stdin("1+2\n:mode lenient\n(2\n\n:quit\n3*3\n")
        .assert()
        .success()
        .stdout("3\nmode: lenient\n2\n");
}

#[test]
fn max_input_len_flag_bounds_each_line() {
    tally()
        .args(["--max-input-len", "3", "eval", "1+2", "1+2+3"])
        .assert()
        .failure()
        .stdout("3\n")
        .stderr(contains("tally::input::input_too_long").and(contains("Input longer than 3 bytes")));
}
