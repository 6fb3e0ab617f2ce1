// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session Gateway configuration, read from the environment per §6.1 — no config file, the
//! binary that owns `main` calls [`GatewayConfig::from_env`] once at startup.

use std::path::PathBuf;

const DEFAULT_SOCKET_SUBPATH: &str = ".agent8/gateway.sock";

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Workspace root every client path is resolved against (`WORKDIR_NAME`).
    pub workspace: PathBuf,
    /// Unix socket path the gateway listens on (`AGENT8_SOCKET_PATH`).
    pub socket_path: PathBuf,
    /// Optional TCP port for remote debugging of the container; unset by default.
    pub tcp_port: Option<u16>,
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        let workspace = std::env::var("WORKDIR_NAME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/workspace")));
        let socket_path = std::env::var("AGENT8_SOCKET_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| workspace.join(DEFAULT_SOCKET_SUBPATH));
        let tcp_port = std::env::var("AGENT8_GATEWAY_TCP_PORT").ok().and_then(|v| v.parse().ok());
        Self { workspace, socket_path, tcp_port }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn socket_path_defaults_under_workspace() {
        std::env::remove_var("AGENT8_SOCKET_PATH");
        std::env::set_var("WORKDIR_NAME", "/tmp/agent8-gateway-config-test");
        let config = GatewayConfig::from_env();
        assert_eq!(config.socket_path, PathBuf::from("/tmp/agent8-gateway-config-test/.agent8/gateway.sock"));
        std::env::remove_var("WORKDIR_NAME");
    }
}
