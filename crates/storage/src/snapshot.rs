// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Issue State Snapshot: the remote-tracker view the Task Engine polls every 30 seconds and
//! diffs against the previous snapshot to detect label and comment transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A point-in-time view of one tracked issue's labels and comment activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueSnapshot {
    /// Labels in the order the tracker returned them. An ordered set, not sorted — label order
    /// on the remote can itself be meaningful (most-recently-applied first, on some trackers).
    pub labels: Vec<String>,
    pub last_comment_at: Option<DateTime<Utc>>,
    pub comment_count: usize,
    pub last_comment: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl IssueSnapshot {
    pub fn empty(at: DateTime<Utc>) -> Self {
        Self { labels: Vec::new(), last_comment_at: None, comment_count: 0, last_comment: None, updated_at: at }
    }
}

/// What changed between two consecutive snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotDiff {
    pub labels_changed: bool,
    pub new_comment_count: usize,
}

impl SnapshotDiff {
    pub fn is_empty(&self) -> bool {
        !self.labels_changed && self.new_comment_count == 0
    }
}

/// Compare two snapshots. Label order is significant (mirrors how the comparison is specified —
/// "ordered set"), so a pure reordering counts as a change; comment growth is counted by the
/// increase in `comment_count` (comments are append-only on the trackers this system targets).
pub fn diff(previous: &IssueSnapshot, current: &IssueSnapshot) -> SnapshotDiff {
    SnapshotDiff {
        labels_changed: previous.labels != current.labels,
        new_comment_count: current.comment_count.saturating_sub(previous.comment_count),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(labels: &[&str], comment_count: usize) -> IssueSnapshot {
        IssueSnapshot {
            labels: labels.iter().map(|s| s.to_string()).collect(),
            last_comment_at: None,
            comment_count,
            last_comment: None,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn no_change_yields_empty_diff() {
        let a = snap(&["TODO"], 2);
        assert!(diff(&a, &a.clone()).is_empty());
    }

    #[test]
    fn label_reorder_counts_as_a_change() {
        let a = snap(&["TODO", "bug"], 0);
        let b = snap(&["bug", "TODO"], 0);
        assert!(diff(&a, &b).labels_changed);
    }

    #[test]
    fn new_comments_are_counted() {
        let a = snap(&["WIP"], 1);
        let b = snap(&["WIP"], 4);
        assert_eq!(diff(&a, &b).new_comment_count, 3);
    }
}
