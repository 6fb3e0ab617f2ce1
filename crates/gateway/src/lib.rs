// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session Gateway: the duplex connection table, request routing to the Process and File
//! Watcher registries, subscription-scoped event fan-out, and the accept loop binding it all to
//! a Unix (and optional TCP) socket.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod connection;
pub mod dispatch;
pub mod error;
pub mod listener;
pub mod session;
pub mod state;

pub use config::GatewayConfig;
pub use connection::{Connection, Outbound};
pub use error::GatewayError;
pub use listener::Listener;
pub use state::GatewayState;

/// Build the shared state and bind the listening socket(s) described by `config`. Returns the
/// [`Listener`] ready for [`Listener::run`]; does not itself start the accept loop, so callers
/// can register shutdown-signal handling around it first.
pub async fn bind(config: &GatewayConfig) -> Result<(Listener, GatewayState), GatewayError> {
    let state = GatewayState::new(config.workspace.clone())?;
    let listener = Listener::bind(&config.socket_path, config.tcp_port, state.clone()).await?;
    Ok((listener, state))
}
