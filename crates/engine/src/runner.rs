// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Action Runner: executes the `Action`s a parsed artifact yields, one at a time, in order.
//! Every action's `filePath` is routed through the Path Sandbox via `agent8_fs`; shell actions run
//! under the one-shot Runner (`agent8_process::run_one_shot`). A failing action does not stop the
//! sequence — every remaining action still runs, and overall task success is the AND of all
//! per-action results.

use std::path::Path;

use agent8_parser::{Action, FileOperation};
use agent8_process::{chown_to, run_one_shot, RunnerConfig, RunnerIdentity};
use agent8_wire::Encoding;

#[derive(Debug, Clone)]
pub struct ActionResult {
    pub success: bool,
    pub output: Option<String>,
    pub error: Option<String>,
    pub action: Action,
}

/// Informational callbacks into the Action Runner's progress. All methods are no-ops by default
/// so callers only implement what they need.
pub trait ActionObserver: Send + Sync {
    /// Called as soon as the parser discovers a new action's opening tag, before it has streamed
    /// any content or run — lets a progress tracker grow its estimate of the total action count as
    /// the upstream response reveals more of them, rather than waiting for completions.
    fn on_discovered(&self, _action: &Action) {}
    fn on_start(&self, _action: &Action) {}
    fn on_complete(&self, _action: &Action, _result: &ActionResult) {}
    fn on_error(&self, _action: &Action, _error: &str) {}
}

pub struct NoopObserver;
impl ActionObserver for NoopObserver {}

/// Run every action in `actions` against `workspace`, in order. Returns one `ActionResult` per
/// action regardless of earlier failures.
pub async fn run_actions(
    workspace: &Path,
    actions: &[Action],
    identity: Option<RunnerIdentity>,
    observer: &dyn ActionObserver,
) -> Vec<ActionResult> {
    let mut results = Vec::with_capacity(actions.len());
    for action in actions {
        observer.on_start(action);
        let result = run_one(workspace, action, identity).await;
        if let Some(error) = &result.error {
            observer.on_error(action, error);
        }
        observer.on_complete(action, &result);
        results.push(result);
    }
    results
}

async fn run_one(workspace: &Path, action: &Action, identity: Option<RunnerIdentity>) -> ActionResult {
    match action {
        Action::File { file_path, operation, content } => {
            run_file_action(workspace, file_path, *operation, content, identity, action).await
        }
        Action::Shell { command, .. } => run_shell_action(workspace, command.as_deref(), identity, action).await,
    }
}

async fn run_file_action(
    workspace: &Path,
    file_path: &str,
    operation: FileOperation,
    content: &str,
    identity: Option<RunnerIdentity>,
    action: &Action,
) -> ActionResult {
    let outcome = match operation {
        FileOperation::Create | FileOperation::Update => {
            agent8_fs::write_file(workspace, file_path, content, Encoding::Utf8).await.map_err(|e| e.to_string())
        }
        FileOperation::Delete => {
            agent8_fs::rm(workspace, file_path, false, false).await.map_err(|e| e.to_string())
        }
    };

    match outcome {
        Ok(()) => {
            if matches!(operation, FileOperation::Create | FileOperation::Update) {
                if let Some(identity) = identity {
                    let resolved = agent8_core::sandbox::resolve(workspace, file_path);
                    if let Err(err) = chown_to(&resolved, identity) {
                        return ActionResult {
                            success: false,
                            output: None,
                            error: Some(format!("chown failed: {err}")),
                            action: action.clone(),
                        };
                    }
                }
            }
            ActionResult { success: true, output: None, error: None, action: action.clone() }
        }
        Err(error) => ActionResult { success: false, output: None, error: Some(error), action: action.clone() },
    }
}

async fn run_shell_action(
    workspace: &Path,
    command: Option<&str>,
    identity: Option<RunnerIdentity>,
    action: &Action,
) -> ActionResult {
    let Some(command) = command else {
        return ActionResult {
            success: false,
            output: None,
            error: Some("shell action has no command".to_string()),
            action: action.clone(),
        };
    };
    let config = RunnerConfig { identity, ..RunnerConfig::default() };
    let result = run_one_shot(workspace, command, &config).await;
    ActionResult { success: result.success, output: Some(result.output), error: result.error, action: action.clone() }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
