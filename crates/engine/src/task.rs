// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `Task` and its supporting types, per SPEC_FULL.md §3's Task data model entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use agent8_core::{Breadcrumb, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Coordinates of the tracked issue this task drives to completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitlabInfo {
    pub project_id: u64,
    pub issue_iid: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    pub commit_hash: Option<String>,
    pub branch: Option<String>,
    pub actions_run: usize,
    pub actions_failed: usize,
    /// Set when this result came from a forced completion rather than the normal lifecycle
    /// finishing on its own, e.g. the tracked issue was moved to `DONE` by a human mid-task.
    #[serde(default)]
    pub forced_completion: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

impl TaskResult {
    /// The `{forcedCompletion:true, reason}` synthesis result used when a task is aborted early
    /// because the tracked issue moved to `DONE` out from under it.
    pub fn forced(reason: impl Into<String>) -> Self {
        Self {
            commit_hash: None,
            branch: None,
            actions_run: 0,
            actions_failed: 0,
            forced_completion: true,
            reason: Some(reason.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub user_id: String,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// 10 on start, 30 after the upstream request returns, `30 + (i/N)*50` capped at 95 after
    /// each of N actions, 100 on completion.
    pub progress: u8,
    pub result: Option<TaskResult>,
    pub error: Option<Breadcrumb>,
    pub gitlab_info: GitlabInfo,
    pub raw_content_file: String,
    pub metadata_file: String,
}

impl Task {
    pub fn new(id: TaskId, user_id: impl Into<String>, gitlab_info: GitlabInfo, created_at: DateTime<Utc>) -> Self {
        Self {
            raw_content_file: format!("{id}.raw"),
            metadata_file: format!("{id}.json"),
            id,
            user_id: user_id.into(),
            status: TaskStatus::Pending,
            created_at,
            completed_at: None,
            progress: 0,
            result: None,
            error: None,
            gitlab_info,
        }
    }

    pub fn set_progress(&mut self, progress: u8) {
        self.progress = self.progress.max(progress.min(100));
    }

    /// Progress after `completed` of `total` actions have run, per the `30 + (i/N)*50` formula,
    /// capped at 95 (the final 5 points are reserved for the finalize/commit/report steps).
    pub fn action_progress(completed: usize, total: usize) -> u8 {
        if total == 0 {
            return 95;
        }
        let raw = 30.0 + (completed as f64 / total as f64) * 50.0;
        raw.min(95.0) as u8
    }

    pub fn fail(&mut self, completed_at: DateTime<Utc>, error: Breadcrumb) {
        self.status = TaskStatus::Failed;
        self.completed_at = Some(completed_at);
        self.error = Some(error);
    }

    pub fn complete(&mut self, completed_at: DateTime<Utc>, result: TaskResult) {
        self.status = TaskStatus::Completed;
        self.completed_at = Some(completed_at);
        self.progress = 100;
        self.result = Some(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_progress_scales_between_30_and_95() {
        assert_eq!(Task::action_progress(0, 4), 30);
        assert_eq!(Task::action_progress(2, 4), 55);
        assert_eq!(Task::action_progress(4, 4), 80);
    }

    #[test]
    fn action_progress_is_95_when_there_are_no_actions() {
        assert_eq!(Task::action_progress(0, 0), 95);
    }

    #[test]
    fn set_progress_never_moves_backwards() {
        let mut task = Task::new(
            TaskId::new(),
            "user-1",
            GitlabInfo { project_id: 1, issue_iid: 2 },
            Utc::now(),
        );
        task.set_progress(30);
        task.set_progress(10);
        assert_eq!(task.progress, 30);
    }
}
