// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("invalid glob pattern {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },
    #[error("watcher not found")]
    NotFound,
    #[error("failed to start filesystem watch: {0}")]
    StartFailed(String),
}

impl WatchError {
    pub fn code(&self) -> &'static str {
        "WATCH_OPERATION_FAILED"
    }
}
