//! Integration tests for the cram CLI commands.
//!
//! Everything here runs offline: no credential is configured, so all
//! generation goes through the deterministic mock path.

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use serial_test::serial;
use tempfile::tempdir;

/// Helper to create a clean command instance with isolated paths.
fn cram(config: &PathBuf, store: &PathBuf) -> Command {
  let mut cmd = Command::cargo_bin("cram").unwrap();
  cmd.arg("--config").arg(config).arg("--store").arg(store).arg("--accept-defaults");
  cmd.env_remove("CRAM_API_KEY");
  cmd
}

/// Helper for isolated config/store paths.
fn temp_paths() -> (tempfile::TempDir, PathBuf, PathBuf) {
  let dir = tempdir().unwrap();
  let config = dir.path().join("config.toml");
  let store = dir.path().join("cram.db");
  (dir, config, store)
}

#[test]
#[serial]
fn test_init_and_clean() {
  let (dir, config, store) = temp_paths();

  cram(&config, &store)
    .arg("init")
    .assert()
    .success()
    .stdout(predicate::str::contains("Initialized cram successfully"));

  assert!(config.exists());
  assert!(store.exists());

  cram(&config, &store)
    .arg("clean")
    .assert()
    .success()
    .stdout(predicate::str::contains("Local store removed"));

  assert!(!store.exists());
  dir.close().unwrap();
}

#[test]
#[serial]
fn test_list_on_an_empty_store() {
  let (dir, config, store) = temp_paths();

  cram(&config, &store)
    .arg("list")
    .assert()
    .success()
    .stdout(predicate::str::contains("Nothing stored yet"));

  dir.close().unwrap();
}

#[test]
#[serial]
fn test_offline_import_workflow() {
  let (dir, config, store) = temp_paths();

  // The word-processor path is a stub, so any bytes make a valid input.
  let document = dir.path().join("notes.docx");
  std::fs::write(&document, b"not a real word document").unwrap();

  cram(&config, &store)
    .arg("import")
    .arg(&document)
    .arg("--qcm")
    .arg("5")
    .arg("--flashcards")
    .arg("4")
    .assert()
    .success()
    .stdout(
      predicate::str::contains("Import complete")
        .and(predicate::str::contains("Quiz questions: 5"))
        .and(predicate::str::contains("Flashcards: 4")),
    );

  cram(&config, &store)
    .arg("list")
    .assert()
    .success()
    .stdout(
      predicate::str::contains("Quiz sets: 1").and(predicate::str::contains("Flashcards: 4")),
    );

  dir.close().unwrap();
}

#[test]
#[serial]
fn test_unsupported_file_is_rejected() {
  let (dir, config, store) = temp_paths();

  let document = dir.path().join("notes.txt");
  std::fs::write(&document, b"du texte").unwrap();

  cram(&config, &store)
    .arg("import")
    .arg(&document)
    .assert()
    .failure()
    .stderr(predicate::str::contains("Unsupported file type"));

  dir.close().unwrap();
}

#[test]
#[serial]
fn test_sync_without_remote_configuration() {
  let (dir, config, store) = temp_paths();

  cram(&config, &store)
    .arg("sync")
    .assert()
    .success()
    .stdout(predicate::str::contains("Cloud sync is not configured"));

  dir.close().unwrap();
}
