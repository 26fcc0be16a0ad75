//! Shared helpers for integration tests

#![allow(dead_code)]

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Run the broadcastq binary with an isolated config directory
pub fn run_broadcastq(args: &[&str]) -> Output {
    let config_home = TempDir::new().expect("temp config dir");
    run_broadcastq_with_config_home(args, config_home.path())
}

pub fn run_broadcastq_with_config_home(args: &[&str], config_home: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_broadcastq"))
        .args(args)
        .env("XDG_CONFIG_HOME", config_home)
        .env("NO_COLOR", "1")
        .output()
        .expect("failed to launch broadcastq")
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Value printed next to `key` in the run summary table
pub fn summary_value(output: &Output, key: &str) -> Option<String> {
    stdout(output).lines().find_map(|line| {
        let line = line.trim();
        let rest = line.strip_prefix(key)?;
        // Keys are padded to a column, so anything after must be whitespace first
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        rest.split_whitespace().next().map(str::to_string)
    })
}
