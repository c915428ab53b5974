//! CLI integration tests
//!
//! These tests run the depclean binary against generated projects.

mod common;

use assert_cmd::Command;
use common::{class_using, simple_class, write_classes, write_jar};
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

const CONFIG: &str = r#"
project:
  outputs: [classes]
dependencies:
  - coordinate: commons-io:commons-io:2.11.0
    path: libs/commons-io.jar
  - coordinate: org.apache.commons:commons-lang3:3.12.0
    category: inherited
    path: libs/commons-lang3.jar
"#;

/// A project using commons-io and declaring commons-lang3 too
fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    let main = class_using("com/example/Main", &["org/apache/commons/io/IOUtils"]);
    write_classes(&dir.path().join("classes"), &[("com/example/Main.class", &main)]);

    std::fs::create_dir_all(dir.path().join("libs")).unwrap();
    let io_utils = simple_class("org/apache/commons/io/IOUtils", "java/lang/Object");
    write_jar(
        &dir.path().join("libs/commons-io.jar"),
        &[("org/apache/commons/io/IOUtils.class", &io_utils)],
    );
    let string_utils = simple_class("org/apache/commons/lang3/StringUtils", "java/lang/Object");
    write_jar(
        &dir.path().join("libs/commons-lang3.jar"),
        &[("org/apache/commons/lang3/StringUtils.class", &string_utils)],
    );

    std::fs::write(dir.path().join("depclean.yml"), CONFIG).unwrap();
    dir
}

fn depclean(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("depclean").unwrap();
    cmd.arg(dir).env("NO_COLOR", "1");
    cmd
}

/// Run depclean with arguments and return (stdout, stderr, success)
fn run_cli(dir: &Path, args: &[&str]) -> (String, String, bool) {
    let output = depclean(dir).args(args).output().expect("Failed to execute command");
    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.success(),
    )
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_cli_help() {
    Command::cargo_bin("depclean")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--fail-if-unused"))
        .stdout(predicate::str::contains("--explain"));
}

#[test]
fn test_cli_terminal_report() {
    let dir = project();
    let (stdout, _, success) = run_cli(dir.path(), &[]);

    assert!(success, "Analysis should succeed");
    assert!(stdout.contains("Found 1 unused declared dependencies"), "{}", stdout);
    assert!(stdout.contains("Unused inherited dependencies"), "{}", stdout);
    assert!(stdout.contains("org.apache.commons:commons-lang3:3.12.0"));
    assert!(stdout.contains("Used direct dependencies"));
}

#[test]
fn test_cli_json_report() {
    let dir = project();
    let (stdout, _, success) = run_cli(dir.path(), &["--format", "json"]);
    assert!(success);

    // logs go to stderr, stdout is the report alone
    let report: serde_json::Value = serde_json::from_str(&stdout).expect("stdout should be JSON");
    assert_eq!(report["used_direct"][0], "commons-io:commons-io:2.11.0");
    assert_eq!(report["unused_inherited"][0], "org.apache.commons:commons-lang3:3.12.0");
    assert_eq!(report["stats"]["classes"], 3);
    assert_eq!(
        report["artifacts"]["commons-io:commons-io:2.11.0"]["used_type_count"],
        1
    );
}

#[test]
fn test_cli_json_to_file() {
    let dir = project();
    let out = dir.path().join("report.json");
    let (stdout, _, success) = run_cli(
        dir.path(),
        &["--format", "json", "--output", out.to_str().unwrap()],
    );

    assert!(success);
    assert!(stdout.contains("Report written to"));
    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(report["version"], "1.0");
}

// ============================================================================
// Options
// ============================================================================

#[test]
fn test_cli_fail_if_unused() {
    let dir = project();
    depclean(dir.path())
        .arg("--fail-if-unused")
        .assert()
        .failure()
        .stderr(predicate::str::contains("declared dependencies are unused"));
}

#[test]
fn test_cli_ignore_pattern_silences_unused() {
    let dir = project();
    depclean(dir.path())
        .args(["--fail-if-unused", "--ignore", "org.apache.commons:.*"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ignored dependencies"))
        .stdout(predicate::str::contains("~ org.apache.commons:commons-lang3:3.12.0"))
        .stdout(predicate::str::contains("Summary: 1 used, 0 unused, 1 ignored"));
}

#[test]
fn test_cli_misspelled_output_fails() {
    let dir = project();
    let config = CONFIG.replace("outputs: [classes]", "outputs: [clases]");
    std::fs::write(dir.path().join("depclean.yml"), config).unwrap();

    depclean(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("project output"));
}

#[test]
fn test_cli_invalid_ignore_pattern() {
    let dir = project();
    let (_, stderr, success) = run_cli(dir.path(), &["--ignore", "commons-io:("]);

    assert!(!success, "An invalid pattern should fail the run");
    assert!(stderr.contains("invalid pattern"), "{}", stderr);
}

#[test]
fn test_cli_explain() {
    let dir = project();
    let (stdout, _, success) = run_cli(
        dir.path(),
        &["--format", "json", "--explain", "commons-io:commons-io:2.11.0"],
    );
    assert!(success);

    let info: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(info["used"], true);
    assert_eq!(info["category"], "direct");
    assert_eq!(info["used_types"][0]["class"], "org.apache.commons.io.IOUtils");
    assert_eq!(
        info["used_types"][0]["referenced_by"][0]["class"],
        "com.example.Main"
    );
}

#[test]
fn test_cli_explain_unknown_dependency() {
    let dir = project();
    depclean(dir.path())
        .args(["--explain", "junit:junit:4.13.2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no declared dependency matches"));

    depclean(dir.path())
        .args(["--explain", "junit"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is not a coordinate"));
}

#[test]
fn test_cli_no_dependencies() {
    let dir = TempDir::new().unwrap();
    depclean(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No dependencies declared."));
}

#[test]
fn test_cli_missing_artifact() {
    let dir = project();
    std::fs::remove_file(dir.path().join("libs/commons-lang3.jar")).unwrap();
    depclean(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read artifact"));
}
