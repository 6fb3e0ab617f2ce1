// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-connection session: reads one request at a time off the wire, dispatches each
//! concurrently, and funnels responses and forwarded events through a single writer task so
//! every outbound frame for a connection goes out over one ordered stream.

use agent8_wire::{encode, read_request, write_message, write_response};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::connection::Outbound;
use crate::dispatch::dispatch;
use crate::state::GatewayState;

/// Drive one client connection until its read side closes (clean disconnect or a framing error).
/// Disconnect always triggers cascade unsubscribe via [`GatewayState::unregister_connection`] —
/// no response is ever emitted for that teardown, per the connection-failure policy.
pub async fn run_session<R, W>(state: GatewayState, mut reader: R, mut writer: W)
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (connection_id, mut outbox) = state.register_connection();
    tracing::info!(%connection_id, "connection opened");

    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbox.recv().await {
            let result = match message {
                Outbound::Response(response) => write_response(&mut writer, &response).await,
                Outbound::Event(event) => match encode(&event) {
                    Ok(payload) => write_message(&mut writer, &payload).await,
                    Err(err) => Err(err),
                },
            };
            if let Err(err) = result {
                tracing::debug!(%connection_id, error = %err, "write failed, closing connection writer");
                break;
            }
        }
    });

    loop {
        match read_request(&mut reader).await {
            Ok(Some(request)) => {
                let state = state.clone();
                tokio::spawn(async move {
                    let response = dispatch(&state, connection_id, &request.id, request.operation).await;
                    state.send_response(connection_id, response);
                });
            }
            Ok(None) => continue,
            Err(err) => {
                tracing::debug!(%connection_id, error = %err, "connection closed");
                break;
            }
        }
    }

    state.unregister_connection(connection_id);
    writer_task.abort();
    tracing::info!(%connection_id, "connection closed");
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
