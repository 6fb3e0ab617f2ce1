// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Gateway-level failures: binding the listening socket and the duplex framing layer. Per-request
//! failures never reach here — they are mapped straight to a wire [`agent8_wire::Response`] by
//! [`crate::dispatch`].

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("failed to bind unix socket at {path}: {source}")]
    UnixBind { path: String, source: std::io::Error },
    #[error("failed to bind tcp listener on port {port}: {source}")]
    TcpBind { port: u16, source: std::io::Error },
    #[error("failed to start the root filesystem watch: {0}")]
    WatchStart(String),
}
