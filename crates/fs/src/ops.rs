// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem operation implementations. Every function takes the workspace root and a
//! caller-supplied path; the path is routed through [`agent8_core::sandbox::resolve`] before any
//! filesystem call, so a traversal attempt is clamped rather than rejected.

use std::collections::HashMap;
use std::path::Path;

use agent8_wire::{DirEntry, Encoding, MountNode};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Serialize;

use crate::error::FsError;

fn decode_content(content: &str, encoding: Encoding) -> Result<Vec<u8>, FsError> {
    match encoding {
        Encoding::Utf8 => Ok(content.as_bytes().to_vec()),
        Encoding::Base64 => BASE64.decode(content).map_err(|_| FsError::InvalidEncoding),
    }
}

fn encode_content(bytes: &[u8], encoding: Encoding) -> Result<String, FsError> {
    match encoding {
        Encoding::Utf8 => {
            String::from_utf8(bytes.to_vec()).map_err(|_| FsError::InvalidEncoding)
        }
        Encoding::Base64 => Ok(BASE64.encode(bytes)),
    }
}

pub async fn read_file(workspace: &Path, path: &str, encoding: Encoding) -> Result<String, FsError> {
    let resolved = agent8_core::sandbox::resolve(workspace, path);
    let bytes = tokio::fs::read(&resolved).await?;
    encode_content(&bytes, encoding)
}

pub async fn write_file(
    workspace: &Path,
    path: &str,
    content: &str,
    encoding: Encoding,
) -> Result<(), FsError> {
    let resolved = agent8_core::sandbox::resolve(workspace, path);
    let bytes = decode_content(content, encoding)?;
    if let Some(parent) = resolved.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&resolved, bytes).await?;
    Ok(())
}

pub async fn rm(workspace: &Path, path: &str, recursive: bool, force: bool) -> Result<(), FsError> {
    let resolved = agent8_core::sandbox::resolve(workspace, path);
    let metadata = match tokio::fs::symlink_metadata(&resolved).await {
        Ok(metadata) => metadata,
        Err(err) if force && err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(err.into()),
    };

    let result = if metadata.is_dir() {
        if recursive {
            tokio::fs::remove_dir_all(&resolved).await
        } else {
            tokio::fs::remove_dir(&resolved).await
        }
    } else {
        tokio::fs::remove_file(&resolved).await
    };

    match result {
        Ok(()) => Ok(()),
        Err(err) if force && err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

pub async fn readdir(
    workspace: &Path,
    path: &str,
    with_file_types: bool,
) -> Result<Vec<DirEntry>, FsError> {
    let resolved = agent8_core::sandbox::resolve(workspace, path);
    let mut read_dir = tokio::fs::read_dir(&resolved).await?;
    let mut entries = Vec::new();
    while let Some(entry) = read_dir.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_directory = if with_file_types {
            entry.file_type().await?.is_dir()
        } else {
            false
        };
        entries.push(DirEntry { name, is_directory });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

pub async fn mkdir(workspace: &Path, path: &str, recursive: bool) -> Result<(), FsError> {
    let resolved = agent8_core::sandbox::resolve(workspace, path);
    if recursive {
        tokio::fs::create_dir_all(&resolved).await?;
    } else {
        tokio::fs::create_dir(&resolved).await?;
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct StatInfo {
    pub size: u64,
    pub is_file: bool,
    pub is_directory: bool,
    pub modified_ms: Option<i64>,
}

pub async fn stat(workspace: &Path, path: &str) -> Result<StatInfo, FsError> {
    let resolved = agent8_core::sandbox::resolve(workspace, path);
    let metadata = tokio::fs::metadata(&resolved).await?;
    let modified_ms = metadata
        .modified()
        .ok()
        .and_then(|time| time.duration_since(std::time::UNIX_EPOCH).ok())
        .and_then(|duration| i64::try_from(duration.as_millis()).ok());
    Ok(StatInfo {
        size: metadata.len(),
        is_file: metadata.is_file(),
        is_directory: metadata.is_dir(),
        modified_ms,
    })
}

/// Materialize a mount tree under `path`. Each file write is atomic (write to a fresh file
/// handle, no partial-write visibility) but the tree as a whole is not transactional: if a file
/// partway through fails, files already written before it stay on disk.
///
/// Implemented iteratively with an explicit work queue rather than async recursion, since the
/// tree depth is caller-controlled and unbounded.
pub async fn mount(
    workspace: &Path,
    path: &str,
    tree: &HashMap<String, MountNode>,
) -> Result<(), FsError> {
    let root = agent8_core::sandbox::resolve(workspace, path);
    let mut queue: std::collections::VecDeque<(std::path::PathBuf, &HashMap<String, MountNode>)> =
        std::collections::VecDeque::new();
    queue.push_back((root, tree));

    while let Some((base, level)) = queue.pop_front() {
        for (name, node) in level {
            let child = base.join(name);
            match node {
                MountNode::File { contents } => {
                    if let Some(parent) = child.parent() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                    tokio::fs::write(&child, contents.as_bytes()).await?;
                }
                MountNode::Directory { tree: sub_tree } => {
                    tokio::fs::create_dir_all(&child).await?;
                    queue.push_back((child, sub_tree));
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "ops_tests.rs"]
mod tests;
