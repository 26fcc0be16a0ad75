//! Configuration file tests

use crate::common::{run_broadcastq, run_broadcastq_with_config_home, stderr, summary_value};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_explicit_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("run.toml");
    fs::write(
        &path,
        "producers = 1\nconsumers = 1\nmessages = 7\n\n[queue]\ncapacity = 3\n",
    )
    .unwrap();

    let output = run_broadcastq(&["--config-file", path.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(summary_value(&output, "published").as_deref(), Some("7"));
    assert_eq!(summary_value(&output, "capacity").as_deref(), Some("3"));
}

#[test]
fn test_cli_overrides_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("run.toml");
    fs::write(&path, "producers = 1\nconsumers = 1\nmessages = 7\n").unwrap();

    let output = run_broadcastq(&["--config-file", path.to_str().unwrap(), "--messages", "3"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(summary_value(&output, "published").as_deref(), Some("3"));
}

#[test]
fn test_default_config_location_is_used() {
    let config_home = TempDir::new().unwrap();
    let app_dir = config_home.path().join("broadcastq");
    fs::create_dir_all(&app_dir).unwrap();
    fs::write(
        app_dir.join("broadcastq.toml"),
        "producers = 1\nconsumers = 1\nmessages = 4\n",
    )
    .unwrap();

    let output = run_broadcastq_with_config_home(&[], config_home.path());
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(summary_value(&output, "published").as_deref(), Some("4"));
}

#[test]
fn test_missing_config_file_fails() {
    let output = run_broadcastq(&["--config-file", "/no/such/broadcastq.toml"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("FATAL"));
}

#[test]
fn test_unknown_key_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "produsers = 2\n").unwrap();

    let output = run_broadcastq(&["--config-file", path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
}
