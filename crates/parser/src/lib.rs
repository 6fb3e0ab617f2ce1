// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Streaming tag parser for the Task Engine's upstream LLM response.
//!
//! The upstream body is a sequence of `N:<json-encoded-string>\n` frames (`N=0` is plain text;
//! other frame kinds are opaque to this system and skipped). Once decoded, the concatenated text
//! is scanned incrementally for `<boltArtifact>`/`<boltAction>` tags with a resumable,
//! position-based state machine: `feed` can be called with arbitrary chunk boundaries and
//! produces the same sequence of events as a single call with the concatenated input would,
//! modulo the chunk granularity of [`ParserEvent::ActionStream`].

mod frames;
mod sanitize;
mod state;
mod tags;

use std::collections::HashMap;

use parking_lot::Mutex;

pub use frames::decode_frame_line;
pub use sanitize::sanitize_content;
pub use state::{Action, Artifact, ArtifactKind, FileOperation, ParserEvent};

use state::MessageState;

/// Resumable multi-message streaming parser. Cheaply cloneable; every clone shares the same
/// per-message-id state table.
#[derive(Clone, Default)]
pub struct StreamParser {
    messages: std::sync::Arc<Mutex<HashMap<String, MessageState>>>,
}

impl StreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a raw fragment of the upstream stream for `message_id`, returning every event the
    /// new data made available. Frame decoding happens first (buffering any partial trailing
    /// line), then the decoded text is appended to this message's running buffer and scanned.
    pub fn feed(&self, message_id: &str, chunk: &str) -> Vec<ParserEvent> {
        let mut messages = self.messages.lock();
        let state = messages.entry(message_id.to_string()).or_default();
        state.feed(chunk)
    }

    /// Drop the state for `message_id`. Called once a task's stream has ended and the final
    /// reconciling parse is done, so the table does not grow unboundedly across tasks.
    pub fn forget(&self, message_id: &str) {
        self.messages.lock().remove(message_id);
    }
}
