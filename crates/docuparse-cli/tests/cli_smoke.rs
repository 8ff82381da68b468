//! CLI smoke tests - argument surface only, no network.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_commands() {
    Command::cargo_bin("docuparse")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("process")
                .and(predicate::str::contains("batch"))
                .and(predicate::str::contains("config")),
        );
}

#[test]
fn config_path_prints_location() {
    Command::cargo_bin("docuparse")
        .unwrap()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.json"));
}

#[test]
fn process_missing_input_fails() {
    Command::cargo_bin("docuparse")
        .unwrap()
        .args(["process", "definitely-missing.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn process_rejects_non_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "hello").unwrap();

    Command::cargo_bin("docuparse")
        .unwrap()
        .arg("process")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported file format"));
}
