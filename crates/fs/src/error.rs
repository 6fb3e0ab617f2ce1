// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Every filesystem failure collapses to one wire error code; the path is never echoed back to
//! the client (avoid leaking workspace layout in error text).

#[derive(Debug, thiserror::Error)]
pub enum FsError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("invalid content encoding")]
    InvalidEncoding,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FsError {
    /// The single wire error code every variant maps to, per the filesystem failure taxonomy.
    pub fn code(&self) -> &'static str {
        "FILESYSTEM_OPERATION_FAILED"
    }

    /// Message safe to send to the client: never includes the path that triggered the failure.
    pub fn public_message(&self) -> String {
        match self {
            FsError::MissingField(field) => format!("missing required field: {field}"),
            FsError::InvalidEncoding => "invalid content encoding".to_string(),
            FsError::Io(err) => format!("filesystem operation failed: {}", io_kind_text(err)),
        }
    }
}

fn io_kind_text(err: &std::io::Error) -> &'static str {
    use std::io::ErrorKind::*;
    match err.kind() {
        NotFound => "not found",
        PermissionDenied => "permission denied",
        AlreadyExists => "already exists",
        _ => "unexpected error",
    }
}
