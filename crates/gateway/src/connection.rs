// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-connection bookkeeping. A [`Connection`] is the gateway-side handle for one duplex client:
//! its outbound channel (shared by the response path and the event-forwarding path, so both
//! land on the same writer task) and its advisory auth token.

use agent8_core::ConnectionId;
use agent8_wire::{Event, Response};
use parking_lot::Mutex;
use tokio::sync::mpsc;

/// A message queued for a connection's single writer task.
#[derive(Debug, Clone)]
pub enum Outbound {
    Response(Response),
    Event(Event),
}

pub struct Connection {
    pub id: ConnectionId,
    pub outbox: mpsc::UnboundedSender<Outbound>,
    /// Set by an `auth{token}` operation. Advisory only — nothing in this crate currently gates
    /// requests on it; it exists so a future auth policy has somewhere to read from.
    auth_token: Mutex<Option<String>>,
}

impl Connection {
    pub fn new(id: ConnectionId, outbox: mpsc::UnboundedSender<Outbound>) -> Self {
        Self { id, outbox, auth_token: Mutex::new(None) }
    }

    pub fn set_auth_token(&self, token: String) {
        *self.auth_token.lock() = Some(token);
    }

    pub fn auth_token(&self) -> Option<String> {
        self.auth_token.lock().clone()
    }

    pub fn send(&self, message: Outbound) {
        let _ = self.outbox.send(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_token_starts_unset_and_round_trips() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let connection = Connection::new(ConnectionId::new(), tx);
        assert_eq!(connection.auth_token(), None);
        connection.set_auth_token("secret".to_string());
        assert_eq!(connection.auth_token(), Some("secret".to_string()));
    }

    #[test]
    fn send_after_receiver_dropped_does_not_panic() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let connection = Connection::new(ConnectionId::new(), tx);
        connection.send(Outbound::Response(Response::ok_empty("1")));
    }
}
