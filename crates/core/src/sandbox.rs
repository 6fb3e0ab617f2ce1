// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Path sandbox: the single choke point every filesystem-touching request routes through.
//!
//! `resolve` never fails. A caller-supplied path that would escape the workspace is clamped
//! back under it rather than rejected, so the Gateway never has to reason about a "bad path"
//! error for this case — only the normal filesystem errors that follow.

use std::path::{Component, Path, PathBuf};

/// Resolve `user_path` against `workspace`, guaranteeing the result lies under `workspace`.
///
/// `workspace` must already be absolute; it is lexically normalized before use. `user_path` may
/// be relative, absolute, or contain any number of `..` segments — all three are handled without
/// touching the filesystem (no symlink resolution, no existence check).
pub fn resolve(workspace: &Path, user_path: impl AsRef<Path>) -> PathBuf {
    let workspace = normalize(workspace);
    let user_path = user_path.as_ref();

    let joined = workspace.join(strip_root(user_path));
    let candidate = normalize(&joined);
    if candidate.starts_with(&workspace) {
        return candidate;
    }

    // The direct join escaped (too many leading `..`). Strip every `..` and root/prefix
    // component from the user path and rejoin — this can never escape again since no
    // parent-directory components remain.
    let clamped: PathBuf = user_path
        .components()
        .filter(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        .collect();
    normalize(&workspace.join(clamped))
}

/// Strip a leading root/prefix so joining never discards the base path
/// (`PathBuf::join` replaces the base entirely when the argument is absolute).
fn strip_root(path: &Path) -> PathBuf {
    path.components().filter(|c| !matches!(c, Component::RootDir | Component::Prefix(_))).collect()
}

/// Lexically normalize a path: resolve `.` and `..` components without touching the filesystem.
/// A `..` that would pop above the root is simply dropped (can't go higher than `/`).
fn normalize(path: &Path) -> PathBuf {
    let mut stack: Vec<Component> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match stack.last() {
                Some(Component::Normal(_)) => {
                    stack.pop();
                }
                Some(Component::RootDir) | None => {}
                _ => {
                    stack.push(component);
                }
            },
            other => stack.push(other),
        }
    }
    stack.into_iter().collect()
}

#[cfg(test)]
#[path = "sandbox_tests.rs"]
mod tests;
