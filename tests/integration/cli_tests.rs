//! Integration tests for the permgap CLI.
//!
//! Everything here runs offline: AWS-facing paths are covered by unit
//! tests against mock stores/simulators, and the end-to-end tests below
//! use `--requirements-only`, which stops before any AWS call.
//!
//! ```sh
//! cargo test --test integration
//! ```

#![allow(deprecated)] // cargo_bin is deprecated but works fine for standard builds

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

// ============================================================================
// Help and Version tests
// ============================================================================

#[test]
fn test_help_contains_disclaimer() {
    Command::cargo_bin("permgap")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("DISCLAIMER"));
}

#[test]
fn test_help_short_flag() {
    // Short help (-h) shows condensed output, use --help for full DISCLAIMER
    Command::cargo_bin("permgap")
        .unwrap()
        .arg("-h")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"))
        .stdout(predicate::str::contains("--help"));
}

#[test]
fn test_version() {
    Command::cargo_bin("permgap")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_help_shows_all_options() {
    Command::cargo_bin("permgap")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--no-color"))
        .stdout(predicate::str::contains("--verbose"))
        .stdout(predicate::str::contains("--target"))
        .stdout(predicate::str::contains("--output-file"))
        .stdout(predicate::str::contains("--output-format"))
        .stdout(predicate::str::contains("--mappings-file"))
        .stdout(predicate::str::contains("--duplicate-modules"))
        .stdout(predicate::str::contains("--max-concurrency"))
        .stdout(predicate::str::contains("--principal-arn"))
        .stdout(predicate::str::contains("--requirements-only"));
}

#[test]
fn test_invalid_output_format_fails() {
    Command::cargo_bin("permgap")
        .unwrap()
        .args(["--output-format", "invalid"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid"));
}

#[test]
fn test_nonexistent_target_fails() {
    Command::cargo_bin("permgap")
        .unwrap()
        .args(["--target", "/nonexistent/terraform/dir", "--requirements-only"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

// ============================================================================
// Requirements-only end-to-end tests (offline)
// ============================================================================

#[test]
fn test_requirements_from_ssm_fixture() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("main.tf"),
        r#"
resource "aws_ssm_parameter" "x" {
  name  = "/app/secret"
  value = "hunter2"
}

data "aws_ssm_parameter" "y" {
  name = "/app/other"
}
"#,
    )
    .unwrap();

    // The resource contributes read + write, the data source only read;
    // the overlap collapses to four actions.
    Command::cargo_bin("permgap")
        .unwrap()
        .args(["--requirements-only", "--no-color", "--target"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("ssm:DescribeParameters"))
        .stdout(predicate::str::contains("ssm:GetParameter"))
        .stdout(predicate::str::contains("ssm:DeleteParameter"))
        .stdout(predicate::str::contains("ssm:PutParameter"));
}

#[test]
fn test_requirements_json_output() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("main.tf"),
        r#"resource "aws_ssm_parameter" "x" {}"#,
    )
    .unwrap();

    let output = Command::cargo_bin("permgap")
        .unwrap()
        .args([
            "--requirements-only",
            "--no-color",
            "--output-format",
            "json",
            "--target",
        ])
        .arg(dir.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let parsed: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let actions = parsed["required_actions"].as_array().unwrap();
    assert_eq!(actions.len(), 4);
}

#[test]
fn test_unmapped_type_is_warned_about() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("main.tf"),
        r#"resource "aws_not_in_the_table" "x" {}"#,
    )
    .unwrap();

    Command::cargo_bin("permgap")
        .unwrap()
        .args(["--requirements-only", "--no-color", "--target"])
        .arg(dir.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("No action mapping entry"))
        .stderr(predicate::str::contains("aws_not_in_the_table"));
}

#[test]
fn test_under_labeled_block_is_dropped_with_warning() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("main.tf"),
        r#"resource "aws_ssm_parameter" {}"#,
    )
    .unwrap();

    Command::cargo_bin("permgap")
        .unwrap()
        .args([
            "--requirements-only",
            "--no-color",
            "--output-format",
            "json",
            "--target",
        ])
        .arg(dir.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("malformed block"));
}

#[test]
fn test_malformed_hcl_is_fatal() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("main.tf"), "resource \"aws_lb\" {{{").unwrap();

    Command::cargo_bin("permgap")
        .unwrap()
        .args(["--requirements-only", "--no-color", "--target"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("HCL parse error"));
}

#[test]
fn test_duplicate_modules_error_policy_fails() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.tf"), r#"module "net" { source = "./a" }"#).unwrap();
    fs::write(dir.path().join("b.tf"), r#"module "net" { source = "./b" }"#).unwrap();

    Command::cargo_bin("permgap")
        .unwrap()
        .args([
            "--requirements-only",
            "--no-color",
            "--duplicate-modules",
            "error",
            "--target",
        ])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("declared more than once"));
}

#[test]
fn test_custom_mappings_file() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("main.tf"),
        r#"resource "aws_custom_widget" "x" {}"#,
    )
    .unwrap();
    let mappings = dir.path().join("mappings.yaml");
    fs::write(
        &mappings,
        "aws_custom_widget:\n  read:\n    - \"widget:Describe\"\n  write:\n    - \"widget:Create\"\n",
    )
    .unwrap();

    Command::cargo_bin("permgap")
        .unwrap()
        .args(["--requirements-only", "--no-color", "--mappings-file"])
        .arg(&mappings)
        .arg("--target")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("widget:Create"))
        .stdout(predicate::str::contains("widget:Describe"));
}

#[test]
fn test_report_written_to_output_file() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("main.tf"),
        r#"resource "aws_ssm_parameter" "x" {}"#,
    )
    .unwrap();
    let report = dir.path().join("report.txt");

    Command::cargo_bin("permgap")
        .unwrap()
        .args(["--requirements-only", "--no-color", "--output-file"])
        .arg(&report)
        .arg("--target")
        .arg(dir.path())
        .assert()
        .success();

    let content = fs::read_to_string(&report).unwrap();
    assert!(content.contains("ssm:PutParameter"));
}

#[test]
fn test_empty_directory_yields_empty_requirements() {
    let dir = TempDir::new().unwrap();

    Command::cargo_bin("permgap")
        .unwrap()
        .args([
            "--requirements-only",
            "--no-color",
            "--output-format",
            "json",
            "--target",
        ])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"required_actions\": []"));
}
