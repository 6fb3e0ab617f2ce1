// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifier newtypes shared across the gateway, the resource managers, and the task engine.

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Opaque id for a duplex client connection, scoped for the lifetime of the socket.
    pub struct ConnectionId("cxn-");
}

crate::define_id! {
    /// Id of a file-watcher record, returned to the client that created it via `watch`/`watch-paths`.
    pub struct WatcherId("wch-");
}

crate::define_id! {
    /// Id of a task, the unit the Task Engine drives end to end.
    pub struct TaskId("tsk-");
}

/// OS-assigned process id of a spawned child. Unlike the generated ids above, this is not random
/// — it comes straight from the kernel, so it is a thin newtype rather than a `define_id!` type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pid(pub u32);

impl std::fmt::Display for Pid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Pid {
    fn from(value: u32) -> Self {
        Pid(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_id_has_distinct_prefix_from_watcher_id() {
        let c = ConnectionId::new();
        let w = WatcherId::new();
        assert!(c.as_str().starts_with("cxn-"));
        assert!(w.as_str().starts_with("wch-"));
    }

    #[test]
    fn pid_displays_as_bare_number() {
        assert_eq!(Pid(1234).to_string(), "1234");
    }
}
