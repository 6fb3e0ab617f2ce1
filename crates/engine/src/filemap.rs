// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-map builder: walks the workspace, keeping only allow-listed, non-binary, size-capped
//! files to send upstream. Grounded on `agent8-fs::ops::mount`'s iterative, non-recursive-call
//! tree walk (an explicit work queue rather than `async fn` recursion) and reusing
//! `agent8-watch::PatternSet` for exclude-pattern matching rather than recompiling glob handling.

use std::collections::VecDeque;
use std::path::Path;

use agent8_core::Breadcrumb;
use agent8_watch::PatternSet;

use crate::config::EngineConfig;
use crate::error::EngineError;

const BINARY_SNIFF_BYTES: usize = 8192;
const BINARY_NON_PRINTABLE_RATIO: f64 = 0.30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMapEntry {
    pub path: String,
    pub content: String,
}

/// Recursively collect files under `workspace` per `config`'s allow-list/exclude rules. Returns
/// entries sorted by path for deterministic upstream payloads. Exceeding `max_total_bytes` is a
/// fatal error per §4.H.2; an individual file exceeding `max_file_bytes` is simply skipped.
pub async fn build_file_map(
    workspace: &Path,
    config: &EngineConfig,
) -> Result<Vec<FileMapEntry>, EngineError> {
    let excluded = PatternSet::compile(&[], &config.excluded_patterns).map_err(|err| {
        EngineError::FileMap(Breadcrumb::new("filemap", "compile-patterns", err.to_string()))
    })?;

    let mut entries = Vec::new();
    let mut total_bytes = 0u64;
    let mut queue = VecDeque::from([workspace.to_path_buf()]);

    while let Some(dir) = queue.pop_front() {
        let mut read_dir = tokio::fs::read_dir(&dir)
            .await
            .map_err(|err| EngineError::FileMap(Breadcrumb::new("filemap", "readdir", err.to_string())))?;

        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(|err| EngineError::FileMap(Breadcrumb::new("filemap", "readdir", err.to_string())))?
        {
            let path = entry.path();
            let file_type = entry
                .file_type()
                .await
                .map_err(|err| EngineError::FileMap(Breadcrumb::new("filemap", "stat", err.to_string())))?;

            if file_type.is_dir() {
                let name = entry.file_name().to_string_lossy().into_owned();
                if !config.excluded_dirs.iter().any(|d| d == &name) {
                    queue.push_back(path);
                }
                continue;
            }
            if !file_type.is_file() {
                continue;
            }

            let relative = path
                .strip_prefix(workspace)
                .unwrap_or(&path)
                .to_string_lossy()
                .replace('\\', "/");
            if !excluded.matches(&relative) {
                continue;
            }

            let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            if !config.allowed_extensions.iter().any(|a| a == extension) {
                continue;
            }

            let metadata = entry
                .metadata()
                .await
                .map_err(|err| EngineError::FileMap(Breadcrumb::new("filemap", "stat", err.to_string())))?;
            if metadata.len() > config.max_file_bytes {
                continue;
            }

            let bytes = tokio::fs::read(&path)
                .await
                .map_err(|err| EngineError::FileMap(Breadcrumb::new("filemap", "read", err.to_string())))?;
            if looks_binary(&bytes) {
                continue;
            }

            total_bytes += bytes.len() as u64;
            if total_bytes > config.max_total_bytes {
                return Err(EngineError::FileMap(Breadcrumb::new(
                    "filemap",
                    "walk",
                    format!("total file-map size exceeds {} bytes", config.max_total_bytes),
                )));
            }

            entries.push(FileMapEntry { path: relative, content: String::from_utf8_lossy(&bytes).into_owned() });
        }
    }

    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(entries)
}

/// Null byte anywhere in the sample, or more than 30% non-printable bytes (excluding common
/// whitespace), in the first 8 KiB.
fn looks_binary(bytes: &[u8]) -> bool {
    let sample = &bytes[..bytes.len().min(BINARY_SNIFF_BYTES)];
    if sample.is_empty() {
        return false;
    }
    if sample.contains(&0) {
        return true;
    }
    let non_printable = sample
        .iter()
        .filter(|&&b| !matches!(b, b'\n' | b'\r' | b'\t') && (b < 0x20 || b == 0x7f))
        .count();
    (non_printable as f64 / sample.len() as f64) > BINARY_NON_PRINTABLE_RATIO
}

#[cfg(test)]
#[path = "filemap_tests.rs"]
mod tests;
