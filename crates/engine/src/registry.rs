// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-task registry: one `tokio::spawn`ed future runs [`crate::lifecycle::run_task`] to
//! completion, keyed by `TaskId` so the HTTP surface can look up status and the remote poll can
//! force-complete active tasks on a `DONE` label. Grounded on the teacher's connection listener
//! (`crates/daemon/src/listener/mod.rs`), which likewise spawns one task per unit of work behind
//! a shared `Arc`-held context rather than awaiting them inline.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use agent8_core::TaskId;
use agent8_storage::TaskStorage;
use agent8_vcs::VcsCollaborator;

use crate::config::EngineConfig;
use crate::lifecycle::{run_task, TaskInput};
use crate::task::{Task, TaskResult};

const FORCE_COMPLETE_REASON: &str = "Issue marked DONE";

struct Entry {
    task: Arc<Mutex<Task>>,
    handle: JoinHandle<()>,
}

/// Owns every in-flight task's shared state and its driving future. Entries are never removed on
/// completion — only on process restart, since this system keeps no durable state across one
/// (§ Non-goals) and the remote poll is the source of truth for what's still active.
#[derive(Clone, Default)]
pub struct TaskRegistry {
    entries: Arc<Mutex<HashMap<TaskId, Entry>>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `task`'s lifecycle against `workspace`. `vcs`/`storage`/`client`/`config` are cloned
    /// into the spawned future, so callers typically hold them in an `Arc` already.
    pub fn spawn<V>(
        &self,
        task: Task,
        workspace: PathBuf,
        input: TaskInput,
        vcs: Arc<V>,
        storage: Arc<TaskStorage>,
        parser: agent8_parser::StreamParser,
        client: reqwest::Client,
        config: Arc<EngineConfig>,
    ) -> Arc<Mutex<Task>>
    where
        V: VcsCollaborator,
    {
        let task_id = task.id;
        let shared = Arc::new(Mutex::new(task));
        let shared_for_task = Arc::clone(&shared);

        let handle = tokio::spawn(async move {
            run_task(vcs.as_ref(), storage.as_ref(), &parser, &client, config.as_ref(), &shared_for_task, &workspace, &input)
                .await;
        });

        self.entries.lock().insert(task_id, Entry { task: Arc::clone(&shared), handle });
        shared
    }

    pub fn get(&self, task_id: &TaskId) -> Option<Arc<Mutex<Task>>> {
        self.entries.lock().get(task_id).map(|e| Arc::clone(&e.task))
    }

    pub fn snapshot(&self, task_id: &TaskId) -> Option<Task> {
        self.get(task_id).map(|t| t.lock().clone())
    }

    pub fn list(&self) -> Vec<Task> {
        self.entries.lock().values().map(|e| e.task.lock().clone()).collect()
    }

    /// Active tasks: spawned but whose future hasn't finished yet.
    pub fn active_ids(&self) -> Vec<TaskId> {
        self.entries.lock().iter().filter(|(_, e)| !e.handle.is_finished()).map(|(id, _)| *id).collect()
    }

    /// Abort a still-running task's future, e.g. when the remote issue is moved to `DONE`
    /// directly by a human while the agent is still working it. The shared task transitions to
    /// `completed` with a `{forcedCompletion: true, reason}` synthesis result before the driving
    /// future is aborted, so any caller reading its status afterwards sees a terminal state
    /// rather than whatever partial progress the abort caught it at.
    pub fn force_complete(&self, task_id: &TaskId) {
        if let Some(entry) = self.entries.lock().get(task_id) {
            if !entry.handle.is_finished() {
                entry.task.lock().complete(Utc::now(), TaskResult::forced(FORCE_COMPLETE_REASON));
                entry.handle.abort();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent8_vcs::FakeVcs;
    use chrono::Utc;

    use crate::task::GitlabInfo;

    fn sample_task() -> Task {
        Task::new(TaskId::new(), "user-1", GitlabInfo { project_id: 1, issue_iid: 2 }, Utc::now())
    }

    fn sample_input() -> TaskInput {
        TaskInput {
            target_server_url: "http://127.0.0.1:0".to_string(),
            task_token: "tok".to_string(),
            messages: serde_json::json!([]),
            prompt_id: None,
            context_optimization: None,
            mcp_context: None,
            repo_url: "https://example.invalid/repo.git".to_string(),
            issue_title: "title".to_string(),
            issue_body: None,
        }
    }

    #[tokio::test]
    async fn spawned_task_is_retrievable_by_id() {
        let registry = TaskRegistry::new();
        let dir = tempfile::tempdir().unwrap();
        let task = sample_task();
        let task_id = task.id;

        registry.spawn(
            task,
            dir.path().to_path_buf(),
            sample_input(),
            Arc::new(FakeVcs::new()),
            Arc::new(TaskStorage::under_workspace(dir.path())),
            agent8_parser::StreamParser::new(),
            reqwest::Client::new(),
            Arc::new(EngineConfig::from_env()),
        );

        assert!(registry.get(&task_id).is_some());
        assert_eq!(registry.list().len(), 1);
    }

    #[tokio::test]
    async fn force_complete_aborts_a_still_running_task() {
        let registry = TaskRegistry::new();
        let dir = tempfile::tempdir().unwrap();
        let task = sample_task();
        let task_id = task.id;

        registry.spawn(
            task,
            dir.path().to_path_buf(),
            sample_input(),
            Arc::new(FakeVcs::new()),
            Arc::new(TaskStorage::under_workspace(dir.path())),
            agent8_parser::StreamParser::new(),
            reqwest::Client::new(),
            Arc::new(EngineConfig::from_env()),
        );

        registry.force_complete(&task_id);

        let task = registry.snapshot(&task_id).unwrap();
        assert_eq!(task.status, crate::task::TaskStatus::Completed);
        let result = task.result.unwrap();
        assert!(result.forced_completion);
        assert_eq!(result.reason.as_deref(), Some("Issue marked DONE"));
    }
}
