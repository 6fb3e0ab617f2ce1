// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared gateway context: the resource managers plus the live connection table and the
//! background tasks that translate resource-manager events into wire [`Event`]s fanned out to
//! subscribers. One instance is built at startup and handed to every connection's session task.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use agent8_core::ConnectionId;
use agent8_process::{ProcessEvent, ProcessEventKind, ProcessRegistry};
use agent8_watch::{FileChangeKind as WatchFileChangeKind, WatchEvent, WatcherRegistry};
use agent8_wire::{Event, FileChangeKind, PortEventKind, ProcessStream};
use parking_lot::RwLock;
use tokio::sync::mpsc;

use crate::connection::{Connection, Outbound};
use crate::error::GatewayError;

fn event_id() -> String {
    format!("evt-{}", nanoid::nanoid!(12))
}

fn wire_process_event(event: ProcessEvent) -> Event {
    let pid = event.pid.0;
    let (stream, data) = match event.kind {
        ProcessEventKind::Stdout(bytes) => (ProcessStream::Stdout, String::from_utf8_lossy(&bytes).into_owned()),
        ProcessEventKind::Stderr(bytes) => (ProcessStream::Stderr, String::from_utf8_lossy(&bytes).into_owned()),
        ProcessEventKind::Exit(code) => (ProcessStream::Exit, code.map(|c| c.to_string()).unwrap_or_default()),
    };
    Event::Process { id: event_id(), pid, stream, data }
}

fn wire_watch_event(event: WatchEvent) -> Event {
    let event_type = match event.event_type {
        WatchFileChangeKind::Change => FileChangeKind::Change,
        WatchFileChangeKind::Rename => FileChangeKind::Rename,
    };
    Event::FileChange {
        id: event_id(),
        watcher_id: event.watcher_id.as_str().to_string(),
        event_type,
        filename: event.filename,
    }
}

/// Shared state handed to every connection session. Cheaply cloneable — everything lives behind
/// an `Arc` or is already a cheaply-cloneable registry handle.
#[derive(Clone)]
pub struct GatewayState {
    pub workspace: PathBuf,
    pub processes: ProcessRegistry,
    pub watchers: Arc<WatcherRegistry>,
    connections: Arc<RwLock<HashMap<ConnectionId, Arc<Connection>>>>,
}

impl GatewayState {
    pub fn new(workspace: PathBuf) -> Result<Self, GatewayError> {
        let (processes, process_events) = ProcessRegistry::new();
        let (watchers, watch_events) =
            WatcherRegistry::new(workspace.clone()).map_err(|e| GatewayError::WatchStart(e.to_string()))?;

        let state = Self {
            workspace,
            processes,
            watchers: Arc::new(watchers),
            connections: Arc::new(RwLock::new(HashMap::new())),
        };

        state.clone().spawn_process_forwarder(process_events);
        state.clone().spawn_watch_forwarder(watch_events);
        Ok(state)
    }

    fn spawn_process_forwarder(self, mut events: mpsc::UnboundedReceiver<ProcessEvent>) {
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                let pid = event.pid;
                let wire_event = wire_process_event(event);
                for connection in self.processes.subscribers(pid) {
                    self.send_event(connection, wire_event.clone());
                }
            }
        });
    }

    fn spawn_watch_forwarder(self, mut events: mpsc::UnboundedReceiver<WatchEvent>) {
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                let watcher_id = event.watcher_id;
                let wire_event = wire_watch_event(event);
                for connection in self.watchers.subscribers(watcher_id) {
                    self.send_event(connection, wire_event.clone());
                }
            }
        });
    }

    /// Register a fresh connection and return its id plus the receiving half of its outbound
    /// channel, which the per-connection writer task drains.
    pub fn register_connection(&self) -> (ConnectionId, mpsc::UnboundedReceiver<Outbound>) {
        let id = ConnectionId::new();
        let (tx, rx) = mpsc::unbounded_channel();
        self.connections.write().insert(id, Arc::new(Connection::new(id, tx)));
        (id, rx)
    }

    /// Tear down a disconnected connection: cascade-unsubscribe it from every process and
    /// watcher, then drop its entry from the table.
    pub fn unregister_connection(&self, id: ConnectionId) {
        self.processes.unsubscribe_connection(id);
        self.watchers.unsubscribe_connection(id);
        self.connections.write().remove(&id);
    }

    pub fn set_auth_token(&self, id: ConnectionId, token: String) {
        if let Some(connection) = self.connections.read().get(&id) {
            connection.set_auth_token(token);
        }
    }

    pub fn auth_token(&self, id: ConnectionId) -> Option<String> {
        self.connections.read().get(&id).and_then(|connection| connection.auth_token())
    }

    pub fn send_response(&self, id: ConnectionId, response: agent8_wire::Response) {
        if let Some(connection) = self.connections.read().get(&id) {
            connection.send(Outbound::Response(response));
        }
    }

    fn send_event(&self, id: ConnectionId, event: Event) {
        if let Some(connection) = self.connections.read().get(&id) {
            connection.send(Outbound::Event(event));
        }
    }

    /// Broadcast `event` to every currently connected client — used for `port` events, the one
    /// kind not scoped to a pid or watcher subscriber set.
    pub fn broadcast(&self, event: Event) {
        debug_assert!(event.is_broadcast(), "broadcast() called with a non-broadcast event kind");
        for connection in self.connections.read().values() {
            connection.send(Outbound::Event(event.clone()));
        }
    }

    pub fn port_event(&self, port: u16, kind: PortEventKind, url: String) {
        self.broadcast(Event::Port { id: event_id(), port, r#type: kind, url });
    }

    /// Tear down every live resource in shutdown order: kill every process, close every watcher,
    /// then close every connection. No graceful draining.
    pub fn shutdown(&self) {
        self.processes.kill_all();
        self.watchers.stop_all();
        self.connections.write().clear();
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
