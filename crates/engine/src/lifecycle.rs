// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Task Engine lifecycle: create → build file map → upstream call → stream process →
//! finalize → commit & push → report, per §4.H. Driven as one `tokio::spawn`ed future per task
//! (see [`crate::registry`]), the way the teacher's daemon owns one future per worker/cron loop.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use agent8_core::{Breadcrumb, RetryPolicy};
use agent8_parser::{Action, ParserEvent, StreamParser};
use agent8_storage::{StreamCounters, TaskMetadata, TaskStorage};
use agent8_vcs::{MergeRequestOptions, VcsCollaborator};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::filemap::build_file_map;
use crate::labels;
use crate::runner::{run_actions, ActionObserver, ActionResult};
use crate::task::{Task, TaskResult, TaskStatus};
use crate::upstream::{stream_upstream, UpstreamPayload};

const GITIGNORE_TEMPLATE: &str = "target/\nnode_modules/\ndist/\nbuild/\n.agent8/\n";

/// Everything the lifecycle needs that came from the task-creation request, per §6's Task
/// creation shape.
#[derive(Debug, Clone)]
pub struct TaskInput {
    pub target_server_url: String,
    pub task_token: String,
    pub messages: serde_json::Value,
    pub prompt_id: Option<String>,
    pub context_optimization: Option<bool>,
    pub mcp_context: Option<serde_json::Value>,
    pub repo_url: String,
    pub issue_title: String,
    pub issue_body: Option<String>,
}

/// Tracks live progress by updating the shared `Task` record as each action finishes.
/// `estimated_total` grows as the parser discovers each action's opening tag (see
/// [`ActionObserver::on_discovered`]), since the upstream response streams actions one at a time
/// and the true count isn't known up front.
struct ProgressObserver {
    task: Arc<Mutex<Task>>,
    completed: AtomicUsize,
    estimated_total: AtomicUsize,
}

impl ActionObserver for ProgressObserver {
    fn on_discovered(&self, _action: &Action) {
        self.estimated_total.fetch_add(1, Ordering::SeqCst);
    }

    fn on_complete(&self, _action: &Action, _result: &ActionResult) {
        let completed = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
        let total = self.estimated_total.load(Ordering::SeqCst).max(completed);
        self.task.lock().set_progress(Task::action_progress(completed, total));
    }
}

/// Run one task end to end. Never panics or propagates an error: every fatal failure is recorded
/// on `task` as `Failed` with a breadcrumb, per §4.H's "Failures" section.
pub async fn run_task<V: VcsCollaborator>(
    vcs: &V,
    storage: &TaskStorage,
    parser: &StreamParser,
    client: &reqwest::Client,
    config: &EngineConfig,
    task: &Arc<Mutex<Task>>,
    workspace: &Path,
    input: &TaskInput,
) {
    {
        let mut t = task.lock();
        t.status = TaskStatus::Running;
        t.set_progress(10);
    }

    let (project_id, issue_iid) = {
        let t = task.lock();
        (t.gitlab_info.project_id, t.gitlab_info.issue_iid)
    };

    let branch = match checkout_for_issue(vcs, workspace, config, input, project_id, issue_iid).await {
        Ok(branch) => Some(branch),
        Err(err) => {
            tracing::warn!(error = %err, "vcs checkout failed, continuing locally");
            None
        }
    };

    let files = match build_file_map(workspace, config).await {
        Ok(files) => files,
        Err(err) => return fail(task, err),
    };

    let task_id = task.lock().id.clone();
    let message_id = task_id.to_string();

    let mut writer = match storage.create_raw_writer(&task_id).await {
        Ok(writer) => writer,
        Err(err) => return fail(task, err.into()),
    };

    let mut request_headers = HashMap::new();
    request_headers.insert("Cookie".to_string(), format!("task_token={}", input.task_token));
    let mut metadata = TaskMetadata::started(Utc::now(), request_headers);

    let payload = UpstreamPayload {
        messages: input.messages.clone(),
        files,
        prompt_id: input.prompt_id.clone(),
        context_optimization: input.context_optimization,
        mcp_context: input.mcp_context.clone(),
    };

    task.lock().set_progress(30);

    let (events_tx, events_rx) = mpsc::unbounded_channel::<ParserEvent>();
    let observer = ProgressObserver {
        task: Arc::clone(task),
        completed: AtomicUsize::new(0),
        estimated_total: AtomicUsize::new(0),
    };

    let stream_fut = stream_upstream(
        client,
        &input.target_server_url,
        &input.task_token,
        &payload,
        config.upstream_inactivity_budget,
        &mut writer,
        parser,
        &message_id,
        events_tx,
    );
    let drive_fut = drive_actions(events_rx, workspace, config, &observer);

    let (stream_result, action_results) = tokio::join!(stream_fut, drive_fut);
    let _ = writer.close().await;
    parser.forget(&message_id);

    if let Err(err) = stream_result {
        return fail(task, err);
    }

    metadata.counters = reconcile_counts(storage, &task_id).await.unwrap_or_default();
    metadata.timing.completed_at = Some(Utc::now());
    let _ = storage.write_metadata(&task_id, &metadata).await;

    let actions_failed = action_results.iter().filter(|r| !r.success).count();
    if actions_failed > 0 {
        report_action_failure(vcs, project_id, issue_iid, &action_results).await;
        let mut t = task.lock();
        t.fail(Utc::now(), Breadcrumb::new("runner", "actions", format!("{actions_failed} action(s) failed")));
        return;
    }

    match finalize_commit_and_push(vcs, workspace, branch.as_deref(), input).await {
        Ok(CommitOutcome::Clean) => {
            report_success(vcs, config, project_id, issue_iid, None, branch.as_deref()).await;
            complete(task, action_results.len(), None, branch.clone());
        }
        Ok(CommitOutcome::Committed(hash)) => {
            report_success(vcs, config, project_id, issue_iid, Some(&hash), branch.as_deref()).await;
            complete(task, action_results.len(), Some(hash), branch.clone());
        }
        Ok(CommitOutcome::PushFailed { hash, error }) => {
            report_commit_or_push_failure(vcs, project_id, issue_iid, "push", &error).await;
            let mut t = task.lock();
            t.result = Some(TaskResult {
                commit_hash: Some(hash),
                branch: branch.clone(),
                actions_run: action_results.len(),
                actions_failed: 0,
                forced_completion: false,
                reason: None,
            });
            t.fail(Utc::now(), Breadcrumb::new("vcs", "push", error));
        }
        Err(err) => {
            let step = err.breadcrumb().map(|b| b.step.clone()).unwrap_or_else(|| "finalize".to_string());
            report_commit_or_push_failure(vcs, project_id, issue_iid, &step, &err.to_string()).await;
            fail(task, err);
        }
    }
}

async fn drive_actions(
    mut events_rx: mpsc::UnboundedReceiver<ParserEvent>,
    workspace: &Path,
    config: &EngineConfig,
    observer: &dyn ActionObserver,
) -> Vec<ActionResult> {
    let mut results = Vec::new();
    while let Some(event) = events_rx.recv().await {
        match event {
            ParserEvent::ActionOpen(action) => observer.on_discovered(&action),
            ParserEvent::ActionClose(action) => {
                let batch = [action];
                results.extend(run_actions(workspace, &batch, config.runner_identity, observer).await);
            }
            _ => {}
        }
    }
    results
}

async fn checkout_for_issue<V: VcsCollaborator>(
    vcs: &V,
    workspace: &Path,
    config: &EngineConfig,
    input: &TaskInput,
    project_id: u64,
    issue_iid: u64,
) -> Result<String, EngineError> {
    // Fully-qualified to avoid ambiguity with `Clone::clone` on the `&V` receiver.
    VcsCollaborator::clone(vcs, workspace, &input.repo_url).await.map_err(vcs_err("clone"))?;
    let project = vcs.get_project(project_id).await.map_err(vcs_err("get_project"))?;

    let base_branch = match vcs.branch_exists_on_remote(workspace, &config.gitlab_branch).await {
        Ok(true) => config.gitlab_branch.clone(),
        _ => project.default_branch.clone(),
    };
    vcs.checkout(workspace, &base_branch).await.map_err(vcs_err("checkout"))?;

    let branch_name = format!("issue-{issue_iid}-{}", Utc::now().timestamp());
    vcs.checkout_local_branch(workspace, &branch_name).await.map_err(vcs_err("checkout_local_branch"))?;
    vcs.add_config(workspace, "user.name", "agent8").await.map_err(vcs_err("add_config"))?;
    vcs.add_config(workspace, "user.email", "agent8@localhost").await.map_err(vcs_err("add_config"))?;

    let title = format!("Draft: [Issue #{issue_iid}] {}", input.issue_title.trim());
    let description = format!("Closes #{issue_iid}\n\n{}", input.issue_body.as_deref().unwrap_or(""));
    vcs.create_merge_request(MergeRequestOptions {
        project_id,
        source_branch: branch_name.clone(),
        target_branch: base_branch,
        title,
        description,
        draft: true,
    })
    .await
    .map_err(vcs_err("create_merge_request"))?;

    Ok(branch_name)
}

enum CommitOutcome {
    Clean,
    Committed(String),
    PushFailed { hash: String, error: String },
}

async fn finalize_commit_and_push<V: VcsCollaborator>(
    vcs: &V,
    workspace: &Path,
    branch: Option<&str>,
    _input: &TaskInput,
) -> Result<CommitOutcome, EngineError> {
    ensure_gitignore(workspace).await.map_err(|err| {
        EngineError::Vcs(Breadcrumb::new("vcs", "gitignore", err.to_string()))
    })?;
    vcs.add(workspace, "-A").await.map_err(vcs_err("add"))?;
    let status = vcs.status(workspace).await.map_err(vcs_err("status"))?;
    if status.is_clean() {
        return Ok(CommitOutcome::Clean);
    }

    let message = format!("{}\n\nAutomated change for issue.", _input.issue_title.trim());
    let hash = vcs.commit(workspace, &message).await.map_err(vcs_err("commit"))?;

    if let Some(branch) = branch {
        if let Err(err) = vcs.push(workspace, "origin", branch).await {
            return Ok(CommitOutcome::PushFailed { hash, error: err.to_string() });
        }
    }
    Ok(CommitOutcome::Committed(hash))
}

async fn ensure_gitignore(workspace: &Path) -> std::io::Result<()> {
    let path = workspace.join(".gitignore");
    if tokio::fs::try_exists(&path).await.unwrap_or(false) {
        return Ok(());
    }
    tokio::fs::write(path, GITIGNORE_TEMPLATE).await
}

async fn report_success<V: VcsCollaborator>(
    vcs: &V,
    config: &EngineConfig,
    project_id: u64,
    issue_iid: u64,
    commit_hash: Option<&str>,
    branch: Option<&str>,
) {
    let body = format!(
        "Task completed successfully.\n\ncontainer: {}\ncommit: {}\nbranch: {}",
        config.container_id,
        commit_hash.unwrap_or("(no changes)"),
        branch.unwrap_or("(none)"),
    );
    post_comment_with_retry(vcs, project_id, issue_iid, &body).await;
    let _ = vcs
        .update_issue_labels(project_id, issue_iid, &[labels::CONFIRM_NEEDED.to_string()])
        .await;
}

async fn report_action_failure<V: VcsCollaborator>(
    vcs: &V,
    project_id: u64,
    issue_iid: u64,
    results: &[ActionResult],
) {
    let mut body = String::from("One or more actions failed:\n");
    for result in results.iter().filter(|r| !r.success) {
        let kind = match &result.action {
            Action::File { file_path, operation, .. } => format!("file {operation:?} {file_path}"),
            Action::Shell { command, .. } => format!("shell {}", command.as_deref().unwrap_or("(none)")),
        };
        body.push_str(&format!("- {kind}: {}\n", result.error.as_deref().unwrap_or("unknown error")));
    }
    post_comment_with_retry(vcs, project_id, issue_iid, &body).await;
    let _ = vcs.update_issue_labels(project_id, issue_iid, &[labels::REJECT.to_string()]).await;
}

async fn report_commit_or_push_failure<V: VcsCollaborator>(
    vcs: &V,
    project_id: u64,
    issue_iid: u64,
    step: &str,
    error: &str,
) {
    let body = format!("{step} failed: {error}");
    post_comment_with_retry(vcs, project_id, issue_iid, &body).await;
    let _ = vcs.update_issue_labels(project_id, issue_iid, &[labels::REJECT.to_string()]).await;
}

/// One retry after 5 s on a failed comment post, per the shared `RetryPolicy` design note.
async fn post_comment_with_retry<V: VcsCollaborator>(vcs: &V, project_id: u64, issue_iid: u64, body: &str) {
    let policy = RetryPolicy::default();
    let result = policy
        .run(|err: &agent8_vcs::VcsError| err.is_retryable(), || vcs.add_issue_comment(project_id, issue_iid, body))
        .await;
    if let Err(err) = result {
        tracing::error!(error = %err, "failed to post issue comment after retry");
    }
}

async fn reconcile_counts(
    storage: &TaskStorage,
    task_id: &agent8_core::TaskId,
) -> Result<StreamCounters, EngineError> {
    let raw = storage.read_raw(task_id).await?;
    let text = String::from_utf8_lossy(&raw);
    let reconciling = StreamParser::new();
    let events = reconciling.feed("reconcile", &text);
    reconciling.forget("reconcile");

    let mut counters = StreamCounters { bytes_received: raw.len() as u64, ..StreamCounters::default() };
    for event in events {
        match event {
            ParserEvent::TextChunk(_) => counters.text_frames += 1,
            ParserEvent::ArtifactClose(_) => counters.artifacts += 1,
            ParserEvent::ActionClose(_) => counters.actions += 1,
            _ => {}
        }
    }
    Ok(counters)
}

fn fail(task: &Arc<Mutex<Task>>, err: EngineError) {
    let breadcrumb = err.breadcrumb().cloned().unwrap_or_else(|| Breadcrumb::new("engine", "task", err.to_string()));
    task.lock().fail(Utc::now(), breadcrumb);
}

fn complete(task: &Arc<Mutex<Task>>, actions_run: usize, commit_hash: Option<String>, branch: Option<String>) {
    task.lock().complete(
        Utc::now(),
        TaskResult {
            commit_hash,
            branch,
            actions_run,
            actions_failed: 0,
            forced_completion: false,
            reason: None,
        },
    );
}

fn vcs_err(step: &'static str) -> impl Fn(agent8_vcs::VcsError) -> EngineError {
    move |err| EngineError::Vcs(Breadcrumb::new("vcs", step, err.to_string()))
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
