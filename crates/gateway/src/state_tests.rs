// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use agent8_wire::{Event, PortEventKind};

use super::*;

fn new_state() -> (GatewayState, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let state = GatewayState::new(dir.path().to_path_buf()).unwrap();
    (state, dir)
}

#[tokio::test]
async fn registering_a_connection_yields_a_fresh_id_and_channel() {
    let (state, _dir) = new_state();
    let (a, _a_rx) = state.register_connection();
    let (b, _b_rx) = state.register_connection();
    assert_ne!(a, b);
}

#[tokio::test]
async fn unregister_cascades_through_process_and_watcher_subscriptions() {
    let (state, _dir) = new_state();
    let (connection, _rx) = state.register_connection();

    let pid = state.processes.spawn(&state.workspace, "/bin/sh", &["-c".to_string(), "sleep 30".to_string()]).await.unwrap();
    state.processes.subscribe(pid, connection);
    let watcher_id = state.watchers.watch(&["**/*.ts".to_string()], true).unwrap();
    state.watchers.subscribe(watcher_id, connection).unwrap();

    state.unregister_connection(connection);

    assert!(state.processes.subscribers(pid).is_empty());
    assert!(state.watchers.subscribers(watcher_id).is_empty());
}

#[tokio::test]
async fn port_event_broadcasts_to_every_connection() {
    let (state, _dir) = new_state();
    let (_a, mut a_rx) = state.register_connection();
    let (_b, mut b_rx) = state.register_connection();

    state.port_event(3000, PortEventKind::Open, "http://localhost:3000".into());

    let a_message = tokio::time::timeout(Duration::from_secs(1), a_rx.recv()).await.unwrap().unwrap();
    let b_message = tokio::time::timeout(Duration::from_secs(1), b_rx.recv()).await.unwrap().unwrap();
    assert!(matches!(a_message, Outbound::Event(Event::Port { .. })));
    assert!(matches!(b_message, Outbound::Event(Event::Port { .. })));
}

#[tokio::test]
async fn shutdown_kills_processes_stops_watchers_and_clears_connections() {
    let (state, _dir) = new_state();
    let (connection, _rx) = state.register_connection();
    let pid = state.processes.spawn(&state.workspace, "/bin/sh", &["-c".to_string(), "sleep 30".to_string()]).await.unwrap();
    let watcher_id = state.watchers.watch(&["**/*.ts".to_string()], true).unwrap();

    state.shutdown();

    assert!(state.processes.subscribers(pid).is_empty());
    assert!(state.watchers.subscribers(watcher_id).is_empty());
    assert_eq!(state.auth_token(connection), None);
}
