// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Decoding of the upstream stream's line framing: `N:<json-encoded-string>\n`.
//!
//! `N` is a small unsigned frame-kind tag; `N=0` is the only kind this system cares about (plain
//! text). Other kinds carry upstream-internal metadata (e.g. token usage, tool-call framing) that
//! this system has no use for and passes over without error.

/// One decoded frame line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameLine {
    /// `0:"..."` — a plain text fragment, already JSON-unescaped.
    Text(String),
    /// Any other frame kind, carried as its raw (still JSON-encoded) payload. Not surfaced to
    /// callers today, but kept distinct from a parse failure.
    Other { kind: u32, raw: String },
}

/// Decode a single complete line (no trailing `\n`) of the `N:<json>` framing. Returns `None` if
/// the line doesn't match the `N:` prefix shape at all (e.g. a stray blank line), which is
/// dropped rather than treated as an error — the upstream stream is not a wire protocol this
/// system defines, so being lenient here avoids spurious task failures on a field addition.
pub fn decode_frame_line(line: &str) -> Option<FrameLine> {
    let (kind_str, rest) = line.split_once(':')?;
    let kind: u32 = kind_str.parse().ok()?;
    if kind == 0 {
        let text: String = serde_json::from_str(rest).ok()?;
        Some(FrameLine::Text(text))
    } else {
        Some(FrameLine::Other { kind, raw: rest.to_string() })
    }
}
