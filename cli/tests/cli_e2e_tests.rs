//! CLI end-to-end tests that exercise the CLI binary against fixture schemas.
//! These complement `cli_tests.rs` by using the shared fixture files.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const FIXTURES_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../tests/schemas");

#[allow(deprecated)]
fn cmd() -> Command {
    Command::cargo_bin("jsonschema-ts").expect("binary should exist")
}

fn fixture_names() -> Vec<&'static str> {
    vec!["simple", "kitchen_sink", "recursive"]
}

// ── E2E: Parse all fixtures via CLI ─────────────────────────────────────────

#[test]
fn test_cli_e2e_parse_all_fixtures() {
    let dir = TempDir::new().unwrap();

    for name in fixture_names() {
        let input = format!("{FIXTURES_DIR}/{name}.json");
        let output = dir.path().join(format!("{name}.ast.json"));

        cmd()
            .args(["parse", &input])
            .args(["-o", output.to_str().unwrap()])
            .assert()
            .success();

        let content = fs::read_to_string(&output)
            .unwrap_or_else(|e| panic!("Output file for {name} missing: {e}"));
        let ast: serde_json::Value =
            serde_json::from_str(&content).expect("output should be valid JSON");
        assert_eq!(
            ast["root"]["kind"],
            serde_json::json!("reference"),
            "{name}: root should be a named type"
        );
    }
}

// ── E2E: Normalizing normalized output is a no-op ───────────────────────────

#[test]
fn test_cli_e2e_normalize_twice() {
    let dir = TempDir::new().unwrap();

    for name in fixture_names() {
        let input = format!("{FIXTURES_DIR}/{name}.json");
        let once = dir.path().join(format!("{name}.once.json"));
        let twice = dir.path().join(format!("{name}.twice.json"));

        cmd()
            .args(["normalize", &input])
            .args(["-o", once.to_str().unwrap()])
            .assert()
            .success();
        cmd()
            .args(["normalize", once.to_str().unwrap()])
            .args(["--file-name", &format!("{name}.json")])
            .args(["-o", twice.to_str().unwrap()])
            .assert()
            .success();

        assert_eq!(
            fs::read_to_string(&once).unwrap(),
            fs::read_to_string(&twice).unwrap(),
            "{name}: normalization should be idempotent"
        );
    }
}

// ── E2E: Recursive schema terminates ────────────────────────────────────────

#[test]
fn test_cli_e2e_recursive_named_types() {
    let input = format!("{FIXTURES_DIR}/recursive.json");

    cmd()
        .args(["parse", &input, "--format", "compact"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"Tree\""))
        .stdout(predicate::str::contains("\"Link\""));
}

// ── E2E: Error path: malformed input via CLI ────────────────────────────────

#[test]
fn test_cli_e2e_malformed_input() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("malformed.json");
    fs::write(&input, "this is not valid JSON at all {{{").unwrap();

    cmd()
        .args(["normalize", input.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::is_empty().not());
}

// ── E2E: Stdout piping ─────────────────────────────────────────────────────

#[test]
fn test_cli_e2e_stdout_pipe() {
    let input = format!("{FIXTURES_DIR}/simple.json");

    cmd()
        .args(["normalize", &input])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"required\""))
        .stdout(predicate::str::contains("\"additionalProperties\""));
}
