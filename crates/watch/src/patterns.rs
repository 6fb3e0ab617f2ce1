// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Glob pattern compilation and matching, grounded on the same `glob` crate usage the teacher's
//! shell uses for pathname expansion (`crates/shell/src/exec/expand_glob.rs`), simplified here
//! since watch patterns have no shell quoting/escaping to track.

use std::path::{Path, PathBuf};

use crate::error::WatchError;

/// A compiled include/exclude pattern set a watcher matches incoming filesystem events against.
/// Keeps the raw pattern strings alongside the compiled globs so two requests for the same
/// pattern set can be recognized as identical (see [`PatternSet::matches_spec`]).
#[derive(Debug)]
pub struct PatternSet {
    include_raw: Vec<String>,
    exclude_raw: Vec<String>,
    include: Vec<glob::Pattern>,
    exclude: Vec<glob::Pattern>,
}

impl PatternSet {
    pub fn compile(include: &[String], exclude: &[String]) -> Result<Self, WatchError> {
        let compile_all = |patterns: &[String]| -> Result<Vec<glob::Pattern>, WatchError> {
            patterns
                .iter()
                .map(|p| {
                    glob::Pattern::new(p).map_err(|e| WatchError::InvalidPattern {
                        pattern: p.clone(),
                        message: e.to_string(),
                    })
                })
                .collect()
        };
        Ok(Self {
            include_raw: include.to_vec(),
            exclude_raw: exclude.to_vec(),
            include: compile_all(include)?,
            exclude: compile_all(exclude)?,
        })
    }

    /// Matches if `relative_path` satisfies any include pattern and no exclude pattern. An empty
    /// include set matches everything (used by `watch-paths` when only `exclude` is given).
    pub fn matches(&self, relative_path: &str) -> bool {
        let included = self.include.is_empty() || self.include.iter().any(|p| p.matches(relative_path));
        let excluded = self.exclude.iter().any(|p| p.matches(relative_path));
        included && !excluded
    }

    /// Whether this set was compiled from exactly `include`/`exclude`, used to dedupe repeated
    /// `watch`/`watch-paths` requests onto a single underlying watcher.
    pub fn matches_spec(&self, include: &[String], exclude: &[String]) -> bool {
        self.include_raw == include && self.exclude_raw == exclude
    }
}

/// Expand each pattern (relative to `workspace`) into a snapshot of currently matching paths.
/// Used only for the initial enumeration, which callers must ignore — only post-attach events
/// are delivered.
pub fn expand(workspace: &Path, patterns: &[String]) -> Result<Vec<PathBuf>, WatchError> {
    let mut matches = Vec::new();
    for pattern in patterns {
        let full_pattern = workspace.join(pattern);
        let full_pattern = full_pattern.to_string_lossy().into_owned();
        let paths = glob::glob(&full_pattern).map_err(|e| WatchError::InvalidPattern {
            pattern: pattern.clone(),
            message: e.msg.to_string(),
        })?;
        for entry in paths.filter_map(Result::ok) {
            matches.push(entry);
        }
    }
    matches.sort();
    matches.dedup();
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_include_pattern() {
        let set = PatternSet::compile(&["**/*.ts".to_string()], &[]).unwrap();
        assert!(set.matches("src/main.ts"));
        assert!(!set.matches("src/main.rs"));
    }

    #[test]
    fn exclude_overrides_include() {
        let set =
            PatternSet::compile(&["**/*.ts".to_string()], &["**/*.test.ts".to_string()]).unwrap();
        assert!(set.matches("src/main.ts"));
        assert!(!set.matches("src/main.test.ts"));
    }

    #[test]
    fn empty_include_matches_everything_not_excluded() {
        let set = PatternSet::compile(&[], &["**/*.log".to_string()]).unwrap();
        assert!(set.matches("src/main.ts"));
        assert!(!set.matches("debug.log"));
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let result = PatternSet::compile(&["[".to_string()], &[]);
        assert!(result.is_err());
    }
}
