// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VcsError {
    #[error("remote request failed: {0}")]
    Remote(String),
    #[error("remote returned {status}: {body}")]
    RemoteStatus { status: u16, body: String },
    #[error("local git operation failed: {0}")]
    Local(String),
    #[error("not found")]
    NotFound,
}

impl VcsError {
    /// Whether a retry is worth attempting, per the exponential-backoff policy's
    /// `should_retry` predicate: never retry a 404, do retry network errors and 5xx.
    pub fn is_retryable(&self) -> bool {
        match self {
            VcsError::Remote(_) => true,
            VcsError::RemoteStatus { status, .. } => *status >= 500,
            VcsError::Local(_) => false,
            VcsError::NotFound => false,
        }
    }
}

impl From<git2::Error> for VcsError {
    fn from(err: git2::Error) -> Self {
        VcsError::Local(err.to_string())
    }
}
