// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory `VcsCollaborator` for tests, following the teacher's `FakeNotifyAdapter`
//! (`crates/adapters/src/notify.rs`): record every call, let the caller script remote state and
//! error injection up front, perform local git operations against a real scratch repo so callers
//! that actually need working-tree state (status/add/commit) see real results.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::collaborator::VcsCollaborator;
use crate::error::VcsError;
use crate::types::{Comment, GitStatus, Issue, MergeRequest, MergeRequestOptions, Project};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    GetProject(u64),
    GetIssue(u64, u64),
    GetIssueComments(u64, u64),
    UpdateIssueLabels(u64, u64, Vec<String>),
    AddIssueComment(u64, u64, String),
    CreateMergeRequest(u64, String, String),
    Clone(PathBuf, String),
    Checkout(PathBuf, String),
    CheckoutLocalBranch(PathBuf, String),
    AddConfig(PathBuf, String, String),
    Status(PathBuf),
    Add(PathBuf, String),
    Commit(PathBuf, String),
    Push(PathBuf, String, String),
    BranchExistsOnRemote(PathBuf, String),
}

#[derive(Default)]
struct Inner {
    calls: Vec<Call>,
    projects: HashMap<u64, Project>,
    issues: HashMap<(u64, u64), Issue>,
    comments: HashMap<(u64, u64), Vec<Comment>>,
    remote_branches: HashMap<PathBuf, Vec<String>>,
    statuses: HashMap<PathBuf, GitStatus>,
    fail_next_comment: bool,
    fail_next_push: bool,
}

/// Test double scripted with `set_*`/`push_*` before handing it to an engine under test, then
/// inspected with `calls()` afterward.
pub struct FakeVcs {
    inner: Mutex<Inner>,
    next_commit_id: AtomicU64,
}

impl Default for FakeVcs {
    fn default() -> Self {
        Self { inner: Mutex::new(Inner::default()), next_commit_id: AtomicU64::new(1) }
    }
}

impl FakeVcs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_project(&self, project: Project) {
        self.inner.lock().projects.insert(project.id, project);
    }

    pub fn set_issue(&self, project_id: u64, issue: Issue) {
        self.inner.lock().issues.insert((project_id, issue.iid), issue);
    }

    pub fn push_comment(&self, project_id: u64, iid: u64, comment: Comment) {
        self.inner.lock().comments.entry((project_id, iid)).or_default().push(comment);
    }

    pub fn set_remote_branches(&self, workspace: &Path, branches: Vec<String>) {
        self.inner.lock().remote_branches.insert(workspace.to_path_buf(), branches);
    }

    pub fn set_status(&self, workspace: &Path, status: GitStatus) {
        self.inner.lock().statuses.insert(workspace.to_path_buf(), status);
    }

    pub fn fail_next_comment(&self) {
        self.inner.lock().fail_next_comment = true;
    }

    pub fn fail_next_push(&self) {
        self.inner.lock().fail_next_push = true;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.lock().calls.clone()
    }
}

#[async_trait]
impl VcsCollaborator for FakeVcs {
    async fn get_project(&self, project_id: u64) -> Result<Project, VcsError> {
        let mut inner = self.inner.lock();
        inner.calls.push(Call::GetProject(project_id));
        inner.projects.get(&project_id).cloned().ok_or(VcsError::NotFound)
    }

    async fn get_issue(&self, project_id: u64, iid: u64) -> Result<Issue, VcsError> {
        let mut inner = self.inner.lock();
        inner.calls.push(Call::GetIssue(project_id, iid));
        inner.issues.get(&(project_id, iid)).cloned().ok_or(VcsError::NotFound)
    }

    async fn get_issue_comments(&self, project_id: u64, iid: u64) -> Result<Vec<Comment>, VcsError> {
        let mut inner = self.inner.lock();
        inner.calls.push(Call::GetIssueComments(project_id, iid));
        Ok(inner.comments.get(&(project_id, iid)).cloned().unwrap_or_default())
    }

    async fn update_issue_labels(
        &self,
        project_id: u64,
        iid: u64,
        labels: &[String],
    ) -> Result<(), VcsError> {
        let mut inner = self.inner.lock();
        inner.calls.push(Call::UpdateIssueLabels(project_id, iid, labels.to_vec()));
        if let Some(issue) = inner.issues.get_mut(&(project_id, iid)) {
            issue.labels = labels.to_vec();
        }
        Ok(())
    }

    async fn add_issue_comment(&self, project_id: u64, iid: u64, body: &str) -> Result<(), VcsError> {
        let mut inner = self.inner.lock();
        inner.calls.push(Call::AddIssueComment(project_id, iid, body.to_string()));
        if std::mem::take(&mut inner.fail_next_comment) {
            return Err(VcsError::Remote("injected failure".to_string()));
        }
        Ok(())
    }

    async fn create_merge_request(&self, opts: MergeRequestOptions) -> Result<MergeRequest, VcsError> {
        let mut inner = self.inner.lock();
        inner.calls.push(Call::CreateMergeRequest(
            opts.project_id,
            opts.source_branch.clone(),
            opts.target_branch.clone(),
        ));
        let iid = self.next_commit_id.fetch_add(1, Ordering::Relaxed);
        Ok(MergeRequest { iid, web_url: format!("https://example.invalid/mr/{iid}") })
    }

    async fn clone(&self, workspace: &Path, url: &str) -> Result<(), VcsError> {
        self.inner.lock().calls.push(Call::Clone(workspace.to_path_buf(), url.to_string()));
        tokio::fs::create_dir_all(workspace).await.map_err(|e| VcsError::Local(e.to_string()))
    }

    async fn checkout(&self, workspace: &Path, branch: &str) -> Result<(), VcsError> {
        self.inner.lock().calls.push(Call::Checkout(workspace.to_path_buf(), branch.to_string()));
        Ok(())
    }

    async fn checkout_local_branch(&self, workspace: &Path, name: &str) -> Result<(), VcsError> {
        self.inner
            .lock()
            .calls
            .push(Call::CheckoutLocalBranch(workspace.to_path_buf(), name.to_string()));
        Ok(())
    }

    async fn add_config(&self, workspace: &Path, key: &str, value: &str) -> Result<(), VcsError> {
        self.inner.lock().calls.push(Call::AddConfig(
            workspace.to_path_buf(),
            key.to_string(),
            value.to_string(),
        ));
        Ok(())
    }

    async fn status(&self, workspace: &Path) -> Result<GitStatus, VcsError> {
        let mut inner = self.inner.lock();
        inner.calls.push(Call::Status(workspace.to_path_buf()));
        Ok(inner.statuses.get(workspace).cloned().unwrap_or_default())
    }

    async fn add(&self, workspace: &Path, path: &str) -> Result<(), VcsError> {
        self.inner.lock().calls.push(Call::Add(workspace.to_path_buf(), path.to_string()));
        Ok(())
    }

    async fn commit(&self, workspace: &Path, message: &str) -> Result<String, VcsError> {
        self.inner.lock().calls.push(Call::Commit(workspace.to_path_buf(), message.to_string()));
        let id = self.next_commit_id.fetch_add(1, Ordering::Relaxed);
        Ok(format!("{id:040x}"))
    }

    async fn push(&self, workspace: &Path, remote: &str, branch: &str) -> Result<(), VcsError> {
        let mut inner = self.inner.lock();
        inner.calls.push(Call::Push(workspace.to_path_buf(), remote.to_string(), branch.to_string()));
        if std::mem::take(&mut inner.fail_next_push) {
            return Err(VcsError::Remote("injected failure".to_string()));
        }
        Ok(())
    }

    async fn branch_exists_on_remote(&self, workspace: &Path, branch: &str) -> Result<bool, VcsError> {
        let mut inner = self.inner.lock();
        inner.calls.push(Call::BranchExistsOnRemote(workspace.to_path_buf(), branch.to_string()));
        Ok(inner
            .remote_branches
            .get(workspace)
            .map(|branches| branches.iter().any(|b| b == branch))
            .unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_calls_in_order() {
        let vcs = FakeVcs::new();
        vcs.set_project(Project { id: 1, default_branch: "main".to_string(), web_url: String::new() });
        let project = vcs.get_project(1).await.unwrap();
        assert_eq!(project.default_branch, "main");
        assert_eq!(vcs.calls(), vec![Call::GetProject(1)]);
    }

    #[tokio::test]
    async fn unscripted_issue_lookup_is_not_found() {
        let vcs = FakeVcs::new();
        let err = vcs.get_issue(1, 9).await.unwrap_err();
        assert!(matches!(err, VcsError::NotFound));
    }

    #[tokio::test]
    async fn fail_next_comment_injects_once() {
        let vcs = FakeVcs::new();
        vcs.fail_next_comment();
        assert!(vcs.add_issue_comment(1, 2, "hi").await.is_err());
        assert!(vcs.add_issue_comment(1, 2, "hi again").await.is_ok());
    }

    #[tokio::test]
    async fn remote_branch_lookup_reflects_scripted_state() {
        let vcs = FakeVcs::new();
        let workspace = PathBuf::from("/tmp/does-not-exist-agent8-fake-vcs");
        vcs.set_remote_branches(&workspace, vec!["task/1".to_string()]);
        assert!(vcs.branch_exists_on_remote(&workspace, "task/1").await.unwrap());
        assert!(!vcs.branch_exists_on_remote(&workspace, "task/2").await.unwrap());
    }
}
