//! End-to-end runs of the demo driver

use crate::common::{run_broadcastq, stderr, stdout, summary_value};

#[test]
fn test_small_run_delivers_everything() {
    let output = run_broadcastq(&[
        "--capacity",
        "4",
        "--producers",
        "2",
        "--consumers",
        "3",
        "--messages",
        "25",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    assert_eq!(summary_value(&output, "published").as_deref(), Some("50"));
    assert_eq!(summary_value(&output, "delivered").as_deref(), Some("150"));
    assert_eq!(summary_value(&output, "retired").as_deref(), Some("50"));
    assert!(stdout(&output).contains("Consumers"));
}

#[test]
fn test_run_without_consumers_drops_messages() {
    let output = run_broadcastq(&["--consumers", "0", "--producers", "1", "--messages", "10"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    assert_eq!(summary_value(&output, "published").as_deref(), Some("0"));
    assert_eq!(
        summary_value(&output, "dropped (no subscribers)").as_deref(),
        Some("10")
    );
    assert!(!stdout(&output).contains("Consumers"));
}

#[test]
fn test_resize_and_churn_complete() {
    let output = run_broadcastq(&[
        "--capacity",
        "8",
        "--producers",
        "2",
        "--consumers",
        "2",
        "--messages",
        "100",
        "--resize-to",
        "2",
        "--unsubscribe-every",
        "10",
    ]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(summary_value(&output, "capacity").as_deref(), Some("2"));
}

#[test]
fn test_json_logs_go_to_stderr() {
    let output = run_broadcastq(&[
        "--log-format",
        "json",
        "--log-level",
        "info",
        "--producers",
        "1",
        "--consumers",
        "1",
        "--messages",
        "5",
    ]);
    assert!(output.status.success());

    let logs = stderr(&output);
    let first = logs.lines().next().expect("at least one log line");
    let value: serde_json::Value = serde_json::from_str(first).unwrap();
    assert_eq!(value["level"], "INF");
    assert!(!stdout(&output).contains("\"level\""));
}
