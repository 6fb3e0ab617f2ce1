// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use agent8_core::Breadcrumb;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0}")]
    Vcs(Breadcrumb),
    #[error("{0}")]
    FileMap(Breadcrumb),
    #[error("{0}")]
    Upstream(Breadcrumb),
    #[error("{0}")]
    Storage(Breadcrumb),
    #[error("{0}")]
    InvalidLabelTransition { from: String, to: String },
}

impl EngineError {
    /// The breadcrumb carried by failure variants, for attaching to a task's `error` field.
    pub fn breadcrumb(&self) -> Option<&Breadcrumb> {
        match self {
            EngineError::Vcs(b) | EngineError::FileMap(b) | EngineError::Upstream(b) | EngineError::Storage(b) => {
                Some(b)
            }
            EngineError::InvalidLabelTransition { .. } => None,
        }
    }
}

impl From<agent8_storage::StorageError> for EngineError {
    fn from(err: agent8_storage::StorageError) -> Self {
        EngineError::Storage(Breadcrumb::new("storage", "io", err.to_string()))
    }
}
