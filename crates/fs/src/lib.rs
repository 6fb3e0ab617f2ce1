// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sandboxed filesystem operations: `readFile`, `writeFile`, `rm`, `readdir`, `mkdir`, `stat`,
//! `mount`. Every operation resolves its path through the workspace sandbox before touching the
//! filesystem, and every failure collapses to a single `FILESYSTEM_OPERATION_FAILED` wire code.

pub mod error;
pub mod ops;

pub use error::FsError;
pub use ops::{mkdir, mount, read_file, readdir, rm, stat, write_file, StatInfo};
