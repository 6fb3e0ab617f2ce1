// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Accept loop binding the gateway to a Unix socket and, optionally, a TCP port. Grounded on the
//! teacher's `Listener::run`/`run_unix_only`/`run_dual`: one spawned task per accepted
//! connection, `into_split()` into independent reader/writer halves.

use std::path::Path;

use tokio::net::{TcpListener, UnixListener};

use crate::error::GatewayError;
use crate::session::run_session;
use crate::state::GatewayState;

pub struct Listener {
    unix: UnixListener,
    tcp: Option<TcpListener>,
    state: GatewayState,
}

impl Listener {
    /// Bind the Unix socket at `socket_path`, removing a stale socket file left by a previous
    /// unclean shutdown, and optionally a TCP listener on `tcp_port`.
    pub async fn bind(socket_path: &Path, tcp_port: Option<u16>, state: GatewayState) -> Result<Self, GatewayError> {
        if socket_path.exists() {
            let _ = std::fs::remove_file(socket_path);
        }
        if let Some(parent) = socket_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let unix = UnixListener::bind(socket_path).map_err(|source| GatewayError::UnixBind {
            path: socket_path.display().to_string(),
            source,
        })?;

        let tcp = match tcp_port {
            Some(port) => Some(
                TcpListener::bind(("0.0.0.0", port))
                    .await
                    .map_err(|source| GatewayError::TcpBind { port, source })?,
            ),
            None => None,
        };

        Ok(Self { unix, tcp, state })
    }

    /// Run the accept loop until the process is terminated. Each connection is handled in its
    /// own task so one slow or misbehaving client never blocks another.
    pub async fn run(self) {
        match self.tcp {
            Some(tcp) => self.run_dual(tcp).await,
            None => self.run_unix_only().await,
        }
    }

    async fn run_unix_only(self) {
        loop {
            match self.unix.accept().await {
                Ok((stream, _)) => {
                    let state = self.state.clone();
                    tokio::spawn(async move {
                        let (reader, writer) = stream.into_split();
                        run_session(state, reader, writer).await;
                    });
                }
                Err(err) => tracing::error!(error = %err, "unix accept error"),
            }
        }
    }

    async fn run_dual(self, tcp: TcpListener) {
        loop {
            tokio::select! {
                result = self.unix.accept() => {
                    match result {
                        Ok((stream, _)) => {
                            let state = self.state.clone();
                            tokio::spawn(async move {
                                let (reader, writer) = stream.into_split();
                                run_session(state, reader, writer).await;
                            });
                        }
                        Err(err) => tracing::error!(error = %err, "unix accept error"),
                    }
                }
                result = tcp.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            tracing::debug!(%addr, "tcp connection accepted");
                            let state = self.state.clone();
                            tokio::spawn(async move {
                                let (reader, writer) = stream.into_split();
                                run_session(state, reader, writer).await;
                            });
                        }
                        Err(err) => tracing::error!(error = %err, "tcp accept error"),
                    }
                }
            }
        }
    }
}
