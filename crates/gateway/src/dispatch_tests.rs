// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use agent8_wire::Encoding;
use serde_json::json;

use super::*;

fn new_state() -> (GatewayState, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let state = GatewayState::new(dir.path().to_path_buf()).unwrap();
    (state, dir)
}

#[tokio::test]
async fn write_then_read_file_round_trips() {
    let (state, _dir) = new_state();
    let connection = ConnectionId::new();

    let write = dispatch(
        &state,
        connection,
        "1",
        Operation::WriteFile { path: "a.txt".into(), content: "hi".into(), encoding: Encoding::Utf8 },
    )
    .await;
    assert!(write.success);

    let read = dispatch(&state, connection, "2", Operation::ReadFile { path: "a.txt".into(), encoding: Encoding::Utf8 }).await;
    assert!(read.success);
    assert_eq!(read.data, Some(json!("hi")));
}

#[tokio::test]
async fn read_missing_file_is_filesystem_operation_failed() {
    let (state, _dir) = new_state();
    let connection = ConnectionId::new();

    let response =
        dispatch(&state, connection, "1", Operation::ReadFile { path: "missing.txt".into(), encoding: Encoding::Utf8 }).await;

    assert!(!response.success);
    assert_eq!(response.error.unwrap().code, "FILESYSTEM_OPERATION_FAILED");
}

#[tokio::test]
async fn spawn_auto_subscribes_the_spawning_connection() {
    let (state, _dir) = new_state();
    let connection = ConnectionId::new();

    let response = dispatch(
        &state,
        connection,
        "1",
        Operation::Spawn { command: "/bin/sh".into(), args: vec!["-c".into(), "sleep 30".into()] },
    )
    .await;
    assert!(response.success);
    let pid = response.data.unwrap()["pid"].as_u64().unwrap() as u32;

    assert!(state.processes.subscribers(Pid(pid)).contains(&connection));
}

#[tokio::test]
async fn kill_unknown_pid_is_process_not_found() {
    let (state, _dir) = new_state();
    let connection = ConnectionId::new();

    let response = dispatch(&state, connection, "1", Operation::Kill { pid: 999_999 }).await;
    assert!(!response.success);
    assert_eq!(response.error.unwrap().code, "PROCESS_NOT_FOUND");
}

#[tokio::test]
async fn two_connections_watching_the_same_patterns_join_one_watcher() {
    let (state, _dir) = new_state();
    let a = ConnectionId::new();
    let b = ConnectionId::new();

    let first = dispatch(&state, a, "1", Operation::Watch { patterns: vec!["**/*.ts".into()], persistent: true }).await;
    let second = dispatch(&state, b, "2", Operation::Watch { patterns: vec!["**/*.ts".into()], persistent: true }).await;

    let first_id = first.data.unwrap()["watcher_id"].as_str().unwrap().to_string();
    let second_id = second.data.unwrap()["watcher_id"].as_str().unwrap().to_string();
    assert_eq!(first_id, second_id);

    let subscribers = state.watchers.subscribers(WatcherId::from_string(first_id));
    assert!(subscribers.contains(&a));
    assert!(subscribers.contains(&b));
}

#[tokio::test]
async fn differing_patterns_create_distinct_watchers() {
    let (state, _dir) = new_state();
    let connection = ConnectionId::new();

    let first = dispatch(&state, connection, "1", Operation::Watch { patterns: vec!["**/*.ts".into()], persistent: true }).await;
    let second = dispatch(&state, connection, "2", Operation::Watch { patterns: vec!["**/*.rs".into()], persistent: true }).await;

    let first_id = first.data.unwrap()["watcher_id"].as_str().unwrap().to_string();
    let second_id = second.data.unwrap()["watcher_id"].as_str().unwrap().to_string();
    assert_ne!(first_id, second_id);
}

#[tokio::test]
async fn stop_unknown_watcher_is_watch_operation_failed() {
    let (state, _dir) = new_state();
    let connection = ConnectionId::new();

    let response = dispatch(&state, connection, "1", Operation::Stop { watcher_id: "wch-does-not-exist".into() }).await;
    assert!(!response.success);
    assert_eq!(response.error.unwrap().code, "WATCH_OPERATION_FAILED");
}

#[tokio::test]
async fn auth_stores_the_token_on_the_connection() {
    let (state, _dir) = new_state();
    let (connection, _rx) = state.register_connection();

    let response = dispatch(&state, connection, "1", Operation::Auth { token: "secret".into() }).await;
    assert!(response.success);
    assert_eq!(state.auth_token(connection), Some("secret".to_string()));
}
