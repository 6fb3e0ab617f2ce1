// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Routes one decoded [`Operation`] to the filesystem, process, or watch implementation and
//! builds the [`Response`] to send back. Every resource-manager error is mapped to its wire code
//! here; nothing below this layer ever returns a raw error to the client, and exactly one
//! response is produced per request.

use agent8_core::{ConnectionId, Pid, WatcherId};
use agent8_wire::{Operation, Response};
use agent8_watch::WatchError;
use serde::Serialize;

use crate::state::GatewayState;

#[derive(Serialize)]
struct PidData {
    pid: u32,
}

#[derive(Serialize)]
struct WatcherData {
    watcher_id: String,
}

/// Dispatch one request's operation and build its response. `connection` is the id of the
/// connection that sent it, needed for the spawn auto-subscribe and watch-dedup behavior (see
/// [`join_watcher`]) and for recording the advisory auth token.
pub async fn dispatch(state: &GatewayState, connection: ConnectionId, id: &str, operation: Operation) -> Response {
    match operation {
        Operation::ReadFile { path, encoding } => match agent8_fs::read_file(&state.workspace, &path, encoding).await {
            Ok(content) => Response::ok(id, content),
            Err(err) => Response::err(id, err.code(), err.public_message()),
        },
        Operation::WriteFile { path, content, encoding } => {
            match agent8_fs::write_file(&state.workspace, &path, &content, encoding).await {
                Ok(()) => Response::ok_empty(id),
                Err(err) => Response::err(id, err.code(), err.public_message()),
            }
        }
        Operation::Rm { path, recursive, force } => match agent8_fs::rm(&state.workspace, &path, recursive, force).await {
            Ok(()) => Response::ok_empty(id),
            Err(err) => Response::err(id, err.code(), err.public_message()),
        },
        Operation::Readdir { path, with_file_types } => {
            match agent8_fs::readdir(&state.workspace, &path, with_file_types).await {
                Ok(entries) => Response::ok(id, entries),
                Err(err) => Response::err(id, err.code(), err.public_message()),
            }
        }
        Operation::Mkdir { path, recursive } => match agent8_fs::mkdir(&state.workspace, &path, recursive).await {
            Ok(()) => Response::ok_empty(id),
            Err(err) => Response::err(id, err.code(), err.public_message()),
        },
        Operation::Stat { path } => match agent8_fs::stat(&state.workspace, &path).await {
            Ok(info) => Response::ok(id, info),
            Err(err) => Response::err(id, err.code(), err.public_message()),
        },
        Operation::Mount { path, tree } => match agent8_fs::mount(&state.workspace, &path, &tree).await {
            Ok(()) => Response::ok_empty(id),
            Err(err) => Response::err(id, err.code(), err.public_message()),
        },

        Operation::Spawn { command, args } => match state.processes.spawn(&state.workspace, &command, &args).await {
            Ok(pid) => {
                // The spawning connection auto-subscribes to its own pid: the wire protocol has
                // no separate "subscribe" operation, so spawn is the only way a client learns
                // about its own process's output.
                state.processes.subscribe(pid, connection);
                Response::ok(id, PidData { pid: pid.0 })
            }
            Err(err) => Response::err(id, err.code(), err.to_string()),
        },
        Operation::Input { pid, data } => match state.processes.input(Pid(pid), data.as_bytes()).await {
            Ok(()) => Response::ok_empty(id),
            Err(err) => Response::err(id, err.code(), err.to_string()),
        },
        Operation::Kill { pid } => match state.processes.kill(Pid(pid)) {
            Ok(()) => Response::ok_empty(id),
            Err(err) => Response::err(id, err.code(), err.to_string()),
        },
        Operation::Resize { pid, cols, rows } => match state.processes.resize(Pid(pid), cols, rows) {
            Ok(()) => Response::ok_empty(id),
            Err(err) => Response::err(id, err.code(), err.to_string()),
        },

        Operation::Watch { patterns, persistent } => {
            match join_watcher(state, connection, &patterns, &[], persistent) {
                Ok(watcher_id) => Response::ok(id, WatcherData { watcher_id: watcher_id.as_str().to_string() }),
                Err(err) => Response::err(id, err.code(), err.to_string()),
            }
        }
        Operation::WatchPaths { include, exclude, include_content: _ } => {
            match join_watcher(state, connection, &include, &exclude, true) {
                Ok(watcher_id) => Response::ok(id, WatcherData { watcher_id: watcher_id.as_str().to_string() }),
                Err(err) => Response::err(id, err.code(), err.to_string()),
            }
        }
        Operation::Stop { watcher_id } => match state.watchers.stop(WatcherId::from_string(watcher_id)) {
            Ok(()) => Response::ok_empty(id),
            Err(err) => Response::err(id, err.code(), err.to_string()),
        },

        Operation::Auth { token } => {
            state.set_auth_token(connection, token);
            Response::ok_empty(id)
        }
    }
}

/// Join an existing watcher with the same pattern spec if one exists, otherwise start a new one.
/// Either way, `connection` becomes a subscriber of the resulting watcher — this is how a second
/// client joins a watcher another connection already created, since the wire protocol has no
/// separate subscribe operation for watchers either.
fn join_watcher(
    state: &GatewayState,
    connection: ConnectionId,
    include: &[String],
    exclude: &[String],
    persistent: bool,
) -> Result<WatcherId, WatchError> {
    let watcher_id = match state.watchers.find_by_patterns(include, exclude) {
        Some(existing) => existing,
        None if exclude.is_empty() => state.watchers.watch(include, persistent)?,
        None => state.watchers.watch_paths(include, exclude)?,
    };
    state.watchers.subscribe(watcher_id, connection)?;
    Ok(watcher_id)
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
