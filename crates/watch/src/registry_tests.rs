// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use super::*;
use agent8_core::ConnectionId;

#[tokio::test]
async fn two_subscribers_on_same_watcher_both_see_matching_change() {
    let dir = tempfile::tempdir().unwrap();
    let (registry, mut events) = WatcherRegistry::new(dir.path().to_path_buf()).unwrap();

    let watcher_id = registry.watch(&["**/*.ts".to_string()], true).unwrap();
    let a = ConnectionId::new();
    let b = ConnectionId::new();
    registry.subscribe(watcher_id, a).unwrap();
    registry.subscribe(watcher_id, b).unwrap();

    tokio::fs::write(dir.path().join("a.ts"), "1").await.unwrap();

    let event = tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("timed out waiting for file-change event")
        .expect("channel closed");
    assert_eq!(event.watcher_id, watcher_id);
    assert_eq!(event.filename, "a.ts");
    assert_eq!(event.event_type, FileChangeKind::Change);
}

#[tokio::test]
async fn non_matching_file_produces_no_event() {
    let dir = tempfile::tempdir().unwrap();
    let (registry, mut events) = WatcherRegistry::new(dir.path().to_path_buf()).unwrap();
    let watcher_id = registry.watch(&["**/*.ts".to_string()], true).unwrap();
    registry.subscribe(watcher_id, ConnectionId::new()).unwrap();

    tokio::fs::write(dir.path().join("a.rs"), "1").await.unwrap();

    let result = tokio::time::timeout(Duration::from_millis(800), events.recv()).await;
    assert!(result.is_err(), "non-matching file should not produce an event");
}

#[tokio::test]
async fn stop_removes_watcher_even_with_subscribers() {
    let dir = tempfile::tempdir().unwrap();
    let (registry, _events) = WatcherRegistry::new(dir.path().to_path_buf()).unwrap();
    let watcher_id = registry.watch(&["**/*.ts".to_string()], true).unwrap();
    registry.subscribe(watcher_id, ConnectionId::new()).unwrap();

    registry.stop(watcher_id).unwrap();
    assert!(matches!(registry.stop(watcher_id), Err(WatchError::NotFound)));
}

#[tokio::test]
async fn unsubscribe_connection_closes_watcher_when_last_subscriber_leaves() {
    let dir = tempfile::tempdir().unwrap();
    let (registry, _events) = WatcherRegistry::new(dir.path().to_path_buf()).unwrap();
    let watcher_id = registry.watch(&["**/*.ts".to_string()], true).unwrap();
    let connection = ConnectionId::new();
    registry.subscribe(watcher_id, connection).unwrap();

    registry.unsubscribe_connection(connection);
    assert!(matches!(registry.subscribe(watcher_id, ConnectionId::new()), Err(WatchError::NotFound)));
}

#[tokio::test]
async fn find_by_patterns_returns_an_existing_watcher_with_the_same_spec() {
    let dir = tempfile::tempdir().unwrap();
    let (registry, _events) = WatcherRegistry::new(dir.path().to_path_buf()).unwrap();
    let watcher_id = registry.watch(&["**/*.ts".to_string()], true).unwrap();

    assert_eq!(registry.find_by_patterns(&["**/*.ts".to_string()], &[]), Some(watcher_id));
    assert_eq!(registry.find_by_patterns(&["**/*.rs".to_string()], &[]), None);
}

#[tokio::test]
async fn subscribers_reflects_current_subscriber_set() {
    let dir = tempfile::tempdir().unwrap();
    let (registry, _events) = WatcherRegistry::new(dir.path().to_path_buf()).unwrap();
    let watcher_id = registry.watch(&["**/*.ts".to_string()], true).unwrap();
    let connection = ConnectionId::new();

    assert!(registry.subscribers(watcher_id).is_empty());
    registry.subscribe(watcher_id, connection).unwrap();
    assert_eq!(registry.subscribers(watcher_id), std::collections::HashSet::from([connection]));
}

#[tokio::test]
async fn stop_all_removes_every_watcher() {
    let dir = tempfile::tempdir().unwrap();
    let (registry, _events) = WatcherRegistry::new(dir.path().to_path_buf()).unwrap();
    let a = registry.watch(&["**/*.ts".to_string()], true).unwrap();
    let b = registry.watch(&["**/*.rs".to_string()], true).unwrap();

    registry.stop_all();

    assert!(matches!(registry.stop(a), Err(WatchError::NotFound)));
    assert!(matches!(registry.stop(b), Err(WatchError::NotFound)));
}
