// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `<taskId>.raw`: the verbatim upstream stream body. Single writer, many positional readers.
//!
//! The writer appends and `fsync`s after every chunk so the file's on-disk size is always a
//! truthful upper bound on what's readable — a reader polling file size and reading up to it
//! never observes a hole, per the spec's raw-file reader/writer concurrency design note.

use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

use crate::error::StorageError;

/// Exclusive writer for one task's `.raw` file. Holds the only open write handle for the
/// lifetime of the task.
pub struct RawWriter {
    path: PathBuf,
    file: File,
}

impl RawWriter {
    pub async fn create(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file = tokio::fs::OpenOptions::new().create(true).write(true).truncate(true).open(&path).await?;
        Ok(Self { path, file })
    }

    /// Append one chunk and `fsync` before returning, so the new size is immediately observable
    /// to positional readers.
    pub async fn append(&mut self, chunk: &[u8]) -> Result<(), StorageError> {
        self.file.write_all(chunk).await?;
        self.file.sync_data().await?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Close explicitly (also happens implicitly on drop, but the Task Engine calls this so the
    /// "closed on completion or fatal error" invariant has an observable point in the code).
    pub async fn close(mut self) -> Result<(), StorageError> {
        self.file.flush().await?;
        Ok(())
    }
}

/// Read every byte appended since `offset`, returning the new bytes and the new end offset.
/// Opens its own read-only handle each call — no lock is taken against the writer, relying on
/// the filesystem's append-then-fsync ordering instead.
pub async fn tail(path: &Path, offset: u64) -> Result<(Vec<u8>, u64), StorageError> {
    let mut file = match tokio::fs::File::open(path).await {
        Ok(file) => file,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok((Vec::new(), offset)),
        Err(err) => return Err(err.into()),
    };
    let len = file.metadata().await?.len();
    if len <= offset {
        return Ok((Vec::new(), offset));
    }
    file.seek(std::io::SeekFrom::Start(offset)).await?;
    let mut buf = vec![0u8; (len - offset) as usize];
    file.read_exact(&mut buf).await?;
    Ok((buf, len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn append_then_tail_observes_new_bytes_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tsk-1.raw");
        let mut writer = RawWriter::create(&path).await.unwrap();

        writer.append(b"hello ").await.unwrap();
        let (chunk, offset) = tail(&path, 0).await.unwrap();
        assert_eq!(chunk, b"hello ");
        assert_eq!(offset, 6);

        writer.append(b"world").await.unwrap();
        let (chunk, offset) = tail(&path, offset).await.unwrap();
        assert_eq!(chunk, b"world");
        assert_eq!(offset, 11);

        writer.close().await.unwrap();
    }

    #[tokio::test]
    async fn tail_of_missing_file_returns_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.raw");
        let (chunk, offset) = tail(&path, 0).await.unwrap();
        assert!(chunk.is_empty());
        assert_eq!(offset, 0);
    }

    #[tokio::test]
    async fn tail_at_current_offset_returns_nothing_new() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tsk-2.raw");
        let mut writer = RawWriter::create(&path).await.unwrap();
        writer.append(b"abc").await.unwrap();
        let (chunk, _) = tail(&path, 3).await.unwrap();
        assert!(chunk.is_empty());
    }
}
