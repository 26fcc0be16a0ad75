//! CLI argument parsing tests

use crate::common::{run_broadcastq, stderr, stdout};

#[test]
fn test_help_lists_queue_options() {
    let output = run_broadcastq(&["--help"]);
    assert!(output.status.success());

    let help = stdout(&output);
    for flag in [
        "--capacity",
        "--producers",
        "--consumers",
        "--messages",
        "--resize-to",
        "--unsubscribe-every",
        "--config-file",
        "--log-format",
    ] {
        assert!(help.contains(flag), "help should mention {}", flag);
    }
}

#[test]
fn test_version_shows_build_metadata() {
    let output = run_broadcastq(&["--version"]);
    assert!(output.status.success());

    let text = stdout(&output);
    assert!(text.contains(env!("CARGO_PKG_VERSION")));
    assert!(text.contains("built"));
}

#[test]
fn test_invalid_log_format_is_rejected() {
    let output = run_broadcastq(&["--log-format", "xml"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("xml"));
}

#[test]
fn test_zero_capacity_fails_with_message() {
    let output = run_broadcastq(&["--capacity", "0", "--messages", "1"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("FATAL"));
}

#[test]
fn test_resize_to_zero_fails_before_running() {
    let output = run_broadcastq(&["--messages", "10", "--resize-to", "0", "--timeout", "5"]);
    assert_eq!(output.status.code(), Some(1));

    let errors = stderr(&output);
    assert!(errors.contains("FATAL"));
    assert!(errors.contains("resize_to"));
    assert!(!stdout(&output).contains("Run summary"));
}
