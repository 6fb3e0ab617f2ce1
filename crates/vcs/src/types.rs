// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire shapes for the remote-tracker REST calls the `VcsCollaborator` trait exposes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    pub default_branch: String,
    #[serde(default)]
    pub web_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub iid: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    pub body: String,
    pub created_at: DateTime<Utc>,
    /// Comments the tracker itself generates (label changes, MR links, ...) rather than a human
    /// or this system's own posts — the spec's polling logic logs these without acting on them.
    #[serde(default)]
    pub system: bool,
}

#[derive(Debug, Clone)]
pub struct MergeRequestOptions {
    pub project_id: u64,
    pub source_branch: String,
    pub target_branch: String,
    pub title: String,
    pub description: String,
    pub draft: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeRequest {
    pub iid: u64,
    pub web_url: String,
}

/// Result of `git status`, reduced to the one thing the Task Engine's commit step needs: is
/// there anything to commit.
#[derive(Debug, Clone, Default)]
pub struct GitStatus {
    pub changed_paths: Vec<String>,
}

impl GitStatus {
    pub fn is_clean(&self) -> bool {
        self.changed_paths.is_empty()
    }
}
