// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-task file storage (`<taskId>.raw` / `<taskId>.json` under a fixed per-container
//! directory) and the Issue State Snapshot type the Task Engine's remote poll diffs.
//!
//! This system keeps no durable state across process restarts — on boot, task state is rebuilt
//! from the remote issue tracker, not from anything on local disk (an explicit Non-goal). What
//! *does* persist to disk is diagnostic: the raw upstream bytes and their metadata envelope, kept
//! so a failed task can be inspected after the fact.

mod error;
mod metadata;
mod raw;
mod snapshot;

use std::path::{Path, PathBuf};

use agent8_core::TaskId;

pub use error::StorageError;
pub use metadata::{StreamCounters, StreamTiming, TaskMetadata};
pub use raw::RawWriter;
pub use snapshot::{diff, IssueSnapshot, SnapshotDiff};

/// Default directory, relative to the workspace root, holding every task's `.raw`/`.json` pair.
pub const DEFAULT_SUBDIR: &str = ".agent8/llm-responses";

/// Resolves task ids to the `.raw`/`.json` paths under the fixed per-container directory, and
/// opens/reads them.
#[derive(Debug, Clone)]
pub struct TaskStorage {
    root: PathBuf,
}

impl TaskStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `TaskStorage` rooted at `<workspace>/.agent8/llm-responses`.
    pub fn under_workspace(workspace: &Path) -> Self {
        Self::new(workspace.join(DEFAULT_SUBDIR))
    }

    pub fn raw_path(&self, task_id: &TaskId) -> PathBuf {
        self.root.join(format!("{task_id}.raw"))
    }

    pub fn json_path(&self, task_id: &TaskId) -> PathBuf {
        self.root.join(format!("{task_id}.json"))
    }

    /// Open the exclusive writer for a task's `.raw` file, creating the storage directory if
    /// needed.
    pub async fn create_raw_writer(&self, task_id: &TaskId) -> Result<RawWriter, StorageError> {
        RawWriter::create(self.raw_path(task_id)).await
    }

    /// Read every byte appended to `.raw` since `offset`. Used by the streaming status HTTP
    /// surface; takes no lock against the writer.
    pub async fn tail_raw(&self, task_id: &TaskId, offset: u64) -> Result<(Vec<u8>, u64), StorageError> {
        raw::tail(&self.raw_path(task_id), offset).await
    }

    /// Load the full `.raw` file once, for the final reconciling parse after the stream ends.
    pub async fn read_raw(&self, task_id: &TaskId) -> Result<Vec<u8>, StorageError> {
        Ok(tokio::fs::read(self.raw_path(task_id)).await?)
    }

    pub async fn write_metadata(&self, task_id: &TaskId, meta: &TaskMetadata) -> Result<(), StorageError> {
        let path = self.json_path(task_id);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let body = serde_json::to_vec_pretty(meta)?;
        tokio::fs::write(&path, body).await?;
        Ok(())
    }

    pub async fn read_metadata(&self, task_id: &TaskId) -> Result<TaskMetadata, StorageError> {
        let body = tokio::fs::read(self.json_path(task_id)).await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[tokio::test]
    async fn writes_raw_and_metadata_under_the_resolved_paths() {
        let dir = tempfile::tempdir().unwrap();
        let storage = TaskStorage::under_workspace(dir.path());
        let task_id = TaskId::new();

        let mut writer = storage.create_raw_writer(&task_id).await.unwrap();
        writer.append(b"chunk one").await.unwrap();
        writer.close().await.unwrap();

        assert_eq!(storage.read_raw(&task_id).await.unwrap(), b"chunk one");

        let meta = TaskMetadata::started(chrono::Utc::now(), HashMap::new());
        storage.write_metadata(&task_id, &meta).await.unwrap();
        let read_back = storage.read_metadata(&task_id).await.unwrap();
        assert_eq!(read_back.counters.bytes_received, 0);

        assert!(storage.raw_path(&task_id).starts_with(dir.path().join(DEFAULT_SUBDIR)));
    }
}
