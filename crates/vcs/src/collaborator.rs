// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `VcsCollaborator` contract: everything the Task Engine consumes from a remote VCS host
//! plus local repository operations, behind one trait so the engine can be driven by a
//! `FakeVcs` in tests without a real network or git binary.
//!
//! Grounded on the teacher's `NotifyAdapter`/`AgentAdapter` trait-plus-Fake pattern
//! (`crates/adapters/src/notify.rs`): a small `async_trait`, a production adapter, and a fake
//! recording calls for assertions.

use std::path::Path;

use async_trait::async_trait;

use crate::error::VcsError;
use crate::types::{Comment, GitStatus, Issue, MergeRequest, MergeRequestOptions, Project};

#[async_trait]
pub trait VcsCollaborator: Send + Sync + 'static {
    // --- remote tracker ---
    async fn get_project(&self, project_id: u64) -> Result<Project, VcsError>;
    async fn get_issue(&self, project_id: u64, iid: u64) -> Result<Issue, VcsError>;
    async fn get_issue_comments(&self, project_id: u64, iid: u64) -> Result<Vec<Comment>, VcsError>;
    async fn update_issue_labels(
        &self,
        project_id: u64,
        iid: u64,
        labels: &[String],
    ) -> Result<(), VcsError>;
    async fn add_issue_comment(&self, project_id: u64, iid: u64, body: &str) -> Result<(), VcsError>;
    async fn create_merge_request(&self, opts: MergeRequestOptions) -> Result<MergeRequest, VcsError>;

    // --- local repository, rooted at `workspace` ---
    async fn clone(&self, workspace: &Path, url: &str) -> Result<(), VcsError>;
    async fn checkout(&self, workspace: &Path, branch: &str) -> Result<(), VcsError>;
    async fn checkout_local_branch(&self, workspace: &Path, name: &str) -> Result<(), VcsError>;
    async fn add_config(&self, workspace: &Path, key: &str, value: &str) -> Result<(), VcsError>;
    async fn status(&self, workspace: &Path) -> Result<GitStatus, VcsError>;
    async fn add(&self, workspace: &Path, path: &str) -> Result<(), VcsError>;
    async fn commit(&self, workspace: &Path, message: &str) -> Result<String, VcsError>;
    async fn push(&self, workspace: &Path, remote: &str, branch: &str) -> Result<(), VcsError>;
    async fn branch_exists_on_remote(&self, workspace: &Path, branch: &str) -> Result<bool, VcsError>;
}
