// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("failed to spawn process: {0}")]
    SpawnFailed(String),
    #[error("process not found")]
    NotFound,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ProcessError {
    pub fn code(&self) -> &'static str {
        match self {
            ProcessError::SpawnFailed(_) | ProcessError::Io(_) => "SPAWN_ERROR",
            ProcessError::NotFound => "PROCESS_NOT_FOUND",
        }
    }
}
