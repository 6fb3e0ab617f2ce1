// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn successful_command_reports_success_and_output() {
    let dir = tempfile::tempdir().unwrap();
    let result = run_one_shot(dir.path(), "echo hi", &RunnerConfig::default()).await;
    assert!(result.success);
    assert_eq!(result.output.trim(), "hi");
}

#[tokio::test]
async fn nonzero_exit_is_reported_as_failure() {
    let dir = tempfile::tempdir().unwrap();
    let result = run_one_shot(dir.path(), "exit 7", &RunnerConfig::default()).await;
    assert!(!result.success);
    assert!(result.error.unwrap().contains('7'));
}

#[tokio::test]
async fn inactivity_timeout_kills_silent_command() {
    let dir = tempfile::tempdir().unwrap();
    let config = RunnerConfig { inactivity_timeout: Duration::from_millis(100), identity: None };
    let result = run_one_shot(dir.path(), "sleep 30", &config).await;
    assert!(!result.success);
    assert!(result.error.as_deref().unwrap().to_lowercase().contains("timed out"));
}

#[tokio::test]
async fn activity_resets_the_inactivity_timer() {
    let dir = tempfile::tempdir().unwrap();
    let config = RunnerConfig { inactivity_timeout: Duration::from_millis(300), identity: None };
    // Emits output every 100ms for 5 iterations (500ms total), each chunk resetting the 300ms
    // inactivity window, so this should succeed rather than time out.
    let result =
        run_one_shot(dir.path(), "for i in 1 2 3 4 5; do echo x; sleep 0.1; done", &config).await;
    assert!(result.success);
}
