use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

fn write_config(dir: &Path) -> std::path::PathBuf {
    let db_path = dir.join("telemetry.db");
    let config_path = dir.join("config.toml");
    fs::write(
        &config_path,
        format!(
            r#"
[store]
strategy = "lazy"
database_path = "{}"

[logging]
level = "error"
format = "pretty"

[[entity]]
id = "nsw1-wind"
source = "scada"
kind = "generation"
cadence_minutes = 5
"#,
            db_path.display()
        ),
    )
    .expect("write test config");
    config_path
}

#[test]
fn help_lists_subcommands() {
    Command::cargo_bin("gridflux")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("audit"))
        .stdout(predicate::str::contains("reconcile"))
        .stdout(predicate::str::contains("query"));
}

#[test]
fn missing_config_file_is_a_clean_error() {
    Command::cargo_bin("gridflux")
        .unwrap()
        .args([
            "--config",
            "/nonexistent/gridflux.toml",
            "audit",
            "--entity",
            "nsw1-wind",
            "--from",
            "2024-03-01",
            "--to",
            "2024-03-01",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config"));
}

#[test]
fn config_with_invalid_cadence_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
[[entity]]
id = "odd"
source = "scada"
kind = "generation"
cadence_minutes = 7
"#,
    )
    .unwrap();

    Command::cargo_bin("gridflux")
        .unwrap()
        .args([
            "--config",
            config_path.to_str().unwrap(),
            "audit",
            "--entity",
            "odd",
            "--from",
            "2024-03-01",
            "--to",
            "2024-03-01",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config"));
}

#[test]
fn audit_of_empty_store_reports_missing_days() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(dir.path());

    Command::cargo_bin("gridflux")
        .unwrap()
        .args([
            "--config",
            config_path.to_str().unwrap(),
            "audit",
            "--entity",
            "nsw1-wind",
            "--from",
            "2024-03-01",
            "--to",
            "2024-03-02",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("missing"));
}

#[test]
fn audit_json_export_is_parseable() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(dir.path());

    let output = Command::cargo_bin("gridflux")
        .unwrap()
        .env("RUST_LOG", "error")
        .args([
            "--config",
            config_path.to_str().unwrap(),
            "audit",
            "--entity",
            "nsw1-wind",
            "--from",
            "2024-03-01",
            "--to",
            "2024-03-01",
            "--json",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let reports: serde_json::Value = serde_json::from_slice(&output).expect("valid JSON report");
    assert_eq!(reports[0]["status"], "missing");
    assert_eq!(reports[0]["expected_count"], 288);
}

#[test]
fn query_rejects_unknown_smoothing_method() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_config(dir.path());

    Command::cargo_bin("gridflux")
        .unwrap()
        .args([
            "--config",
            config_path.to_str().unwrap(),
            "query",
            "--entities",
            "nsw1-wind",
            "--from",
            "2024-03-01",
            "--to",
            "2024-03-01",
            "--method",
            "median",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown smoothing method"));
}

#[test]
fn audit_requires_a_target() {
    Command::cargo_bin("gridflux")
        .unwrap()
        .args(["audit", "--from", "2024-03-01", "--to", "2024-03-01"])
        .assert()
        .failure();
}
