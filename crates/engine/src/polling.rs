// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote issue polling (§4.H "Remote Issue Polling"): every `issue_poll_interval`, refetch each
//! tracked issue's labels and comments, diff against the last-seen snapshot, and react to a label
//! change a human made directly on the tracker (most importantly, `DONE` force-completes any
//! still-running task for that issue — a human closing the loop out-of-band wins over whatever
//! the agent is doing).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use agent8_core::TaskId;
use agent8_storage::{diff, IssueSnapshot};
use agent8_vcs::{Issue, VcsCollaborator};

use crate::labels;
use crate::registry::TaskRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct IssueKey {
    project_id: u64,
    issue_iid: u64,
}

/// One issue this container is actively driving a task for, plus the snapshot it was last
/// compared against.
struct Tracked {
    task_id: TaskId,
    snapshot: IssueSnapshot,
}

/// Shared set of issues under poll. Cheaply cloneable; every clone shares the same table.
#[derive(Clone)]
pub struct IssuePoller {
    tracked: Arc<Mutex<HashMap<IssueKey, Tracked>>>,
}

impl IssuePoller {
    pub fn new() -> Self {
        Self { tracked: Arc::new(Mutex::new(HashMap::new())) }
    }

    /// Start tracking an issue right after its task is spawned, seeded with the snapshot taken at
    /// creation time so the first poll only reports changes since then.
    pub fn track(&self, project_id: u64, issue_iid: u64, task_id: TaskId, initial: IssueSnapshot) {
        self.tracked.lock().insert(IssueKey { project_id, issue_iid }, Tracked { task_id, snapshot: initial });
    }

    pub fn untrack(&self, project_id: u64, issue_iid: u64) {
        self.tracked.lock().remove(&IssueKey { project_id, issue_iid });
    }

    fn keys(&self) -> Vec<IssueKey> {
        self.tracked.lock().keys().copied().collect()
    }
}

impl Default for IssuePoller {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs forever (intended to be `tokio::spawn`ed once at startup), waking every
/// `config.issue_poll_interval` to refresh every tracked issue.
pub async fn run_polling_loop<V: VcsCollaborator>(
    vcs: Arc<V>,
    poller: IssuePoller,
    registry: TaskRegistry,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        poll_once(vcs.as_ref(), &poller, &registry).await;
    }
}

async fn poll_once<V: VcsCollaborator>(vcs: &V, poller: &IssuePoller, registry: &TaskRegistry) {
    for key in poller.keys() {
        if let Err(err) = poll_one(vcs, poller, registry, key).await {
            tracing::warn!(
                project_id = key.project_id,
                issue_iid = key.issue_iid,
                error = %err,
                "issue poll failed"
            );
        }
    }
}

async fn poll_one<V: VcsCollaborator>(
    vcs: &V,
    poller: &IssuePoller,
    registry: &TaskRegistry,
    key: IssueKey,
) -> Result<(), agent8_vcs::VcsError> {
    let issue = vcs.get_issue(key.project_id, key.issue_iid).await?;
    let comments = vcs.get_issue_comments(key.project_id, key.issue_iid).await?;
    let current = snapshot_from(&issue, &comments);

    let change = {
        let mut tracked = poller.tracked.lock();
        let Some(entry) = tracked.get_mut(&key) else { return Ok(()) };
        let change = diff(&entry.snapshot, &current);
        entry.snapshot = current.clone();
        (entry.task_id, change.labels_changed, change.new_comment_count)
    };
    let (task_id, labels_changed, new_comments) = change;

    if new_comments > 0 {
        tracing::info!(project_id = key.project_id, issue_iid = key.issue_iid, new_comments, "new issue comments observed");
    }
    if !labels_changed {
        return Ok(());
    }

    let new_label = current.labels.iter().find(|l| is_known_label(l));
    match new_label.map(String::as_str) {
        Some(labels::DONE) => {
            registry.force_complete(&task_id);
            poller.untrack(key.project_id, key.issue_iid);
        }
        Some(other) if !is_valid_transition_from_any(other) => {
            tracing::warn!(
                project_id = key.project_id,
                issue_iid = key.issue_iid,
                label = other,
                "observed label with no valid incoming transition, ignoring"
            );
        }
        _ => {}
    }

    Ok(())
}

fn is_known_label(label: &str) -> bool {
    matches!(label, labels::TODO | labels::WIP | labels::CONFIRM_NEEDED | labels::DONE | labels::REJECT)
}

fn is_valid_transition_from_any(to: &str) -> bool {
    [labels::TODO, labels::WIP, labels::CONFIRM_NEEDED, labels::DONE, labels::REJECT]
        .iter()
        .any(|from| labels::is_valid_transition(from, to))
}

fn snapshot_from(issue: &Issue, comments: &[agent8_vcs::Comment]) -> IssueSnapshot {
    let last = comments.iter().max_by_key(|c| c.created_at);
    IssueSnapshot {
        labels: issue.labels.clone(),
        last_comment_at: last.map(|c| c.created_at),
        comment_count: comments.len(),
        last_comment: last.map(|c| c.body.clone()),
        updated_at: last.map(|c| c.created_at).unwrap_or_else(chrono::Utc::now),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent8_vcs::FakeVcs;
    use chrono::Utc;

    fn sample_task_id() -> TaskId {
        TaskId::new()
    }

    fn issue(iid: u64, labels: &[&str]) -> Issue {
        Issue {
            iid,
            title: "title".to_string(),
            description: String::new(),
            labels: labels.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn done_label_force_completes_and_untracks() {
        let vcs = FakeVcs::new();
        vcs.set_issue(1, issue(7, &[labels::DONE]));
        let poller = IssuePoller::new();
        let registry = TaskRegistry::new();
        poller.track(1, 7, sample_task_id(), IssueSnapshot::empty(Utc::now()));

        poll_once(&vcs, &poller, &registry).await;

        assert!(poller.keys().is_empty());
    }

    #[tokio::test]
    async fn unchanged_snapshot_does_not_untrack() {
        let vcs = FakeVcs::new();
        vcs.set_issue(1, issue(8, &[labels::WIP]));
        let poller = IssuePoller::new();
        let registry = TaskRegistry::new();
        let initial = IssueSnapshot { labels: vec![labels::WIP.to_string()], ..IssueSnapshot::empty(Utc::now()) };
        poller.track(1, 8, sample_task_id(), initial);

        poll_once(&vcs, &poller, &registry).await;

        assert_eq!(poller.keys().len(), 1);
    }
}
