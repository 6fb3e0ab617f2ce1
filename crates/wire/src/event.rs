// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Asynchronous push notifications: not a response to any request.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessStream {
    Stdout,
    Stderr,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileChangeKind {
    Change,
    Rename,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortEventKind {
    Open,
    Close,
}

/// A server-pushed notification, tagged on `event`. Every variant carries a server-generated
/// `id`; correlation with a request is never expected (events aren't responses).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum Event {
    #[serde(rename = "process")]
    Process { id: String, pid: u32, stream: ProcessStream, data: String },
    #[serde(rename = "file-change")]
    FileChange { id: String, watcher_id: String, event_type: FileChangeKind, filename: String },
    #[serde(rename = "port")]
    Port { id: String, port: u16, r#type: PortEventKind, url: String },
}

impl Event {
    /// Whether this event must be broadcast to every connected client rather than just the
    /// subscribers of a specific pid/watcher.
    pub fn is_broadcast(&self) -> bool {
        matches!(self, Event::Port { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_event_tags_on_event_field() {
        let event = Event::Process {
            id: "evt-1".into(),
            pid: 123,
            stream: ProcessStream::Exit,
            data: "0".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "process");
        assert_eq!(json["stream"], "exit");
    }

    #[test]
    fn only_port_events_are_broadcast() {
        let port = Event::Port {
            id: "evt-2".into(),
            port: 3000,
            r#type: PortEventKind::Open,
            url: "http://localhost:3000".into(),
        };
        assert!(port.is_broadcast());

        let file_change = Event::FileChange {
            id: "evt-3".into(),
            watcher_id: "wch-1".into(),
            event_type: FileChangeKind::Change,
            filename: "a.ts".into(),
        };
        assert!(!file_change.is_broadcast());
    }
}
