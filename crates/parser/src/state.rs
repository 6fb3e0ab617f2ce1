// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-message resumable state machine: decodes frame lines, then scans the concatenated text
//! for `boltArtifact`/`boltAction` tags, streaming intermediate content and sanitizing it on
//! close.

use crate::frames::{decode_frame_line, FrameLine};
use crate::sanitize::sanitize_content;
use crate::tags::{self, ACTION_CLOSE, ACTION_OPEN, ARTIFACT_CLOSE, ARTIFACT_OPEN};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    File,
    Folder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub id: String,
    pub title: String,
    pub kind: ArtifactKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOperation {
    Create,
    Update,
    Delete,
}

impl Default for FileOperation {
    fn default() -> Self {
        FileOperation::Create
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    File { file_path: String, operation: FileOperation, content: String },
    Shell { command: Option<String>, content: String },
}

impl Action {
    fn with_content(&self, content: String) -> Action {
        match self {
            Action::File { file_path, operation, .. } => {
                Action::File { file_path: file_path.clone(), operation: *operation, content }
            }
            Action::Shell { command, .. } => Action::Shell { command: command.clone(), content },
        }
    }

    fn file_path(&self) -> Option<&str> {
        match self {
            Action::File { file_path, .. } => Some(file_path.as_str()),
            Action::Shell { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParserEvent {
    TextChunk(String),
    ArtifactOpen(Artifact),
    ArtifactClose(Artifact),
    ActionOpen(Action),
    ActionStream(String),
    ActionClose(Action),
}

/// What the scanner is currently inside of, and the attribute/content state for whichever tag
/// that is.
enum Cursor {
    TopLevel,
    InsideArtifact(Artifact),
    InsideAction { artifact: Artifact, action: Action, raw_content: String },
}

/// Resumable parse state for a single message id. `buffer` holds decoded text not yet fully
/// consumed; `frame_tail` holds an undecoded partial line carried over from the previous `feed`.
#[derive(Default)]
pub struct MessageState {
    frame_tail: String,
    buffer: String,
    pos: usize,
    cursor: CursorSlot,
}

/// `Cursor` wrapped so `MessageState` can derive `Default` (artifacts/actions have no sensible
/// default, so the slot starts `None` and is populated lazily).
#[derive(Default)]
struct CursorSlot(Option<Cursor>);

impl Default for Cursor {
    fn default() -> Self {
        Cursor::TopLevel
    }
}

impl MessageState {
    pub fn feed(&mut self, chunk: &str) -> Vec<ParserEvent> {
        self.decode_frames(chunk);
        let mut events = Vec::new();
        self.scan(&mut events);
        self.compact();
        events
    }

    fn decode_frames(&mut self, chunk: &str) {
        self.frame_tail.push_str(chunk);
        loop {
            let Some(newline) = self.frame_tail.find('\n') else { break };
            let line = self.frame_tail[..newline].to_string();
            self.frame_tail.drain(..=newline);
            if let Some(FrameLine::Text(text)) = decode_frame_line(&line) {
                self.buffer.push_str(&text);
            }
        }
    }

    fn cursor_take(&mut self) -> Cursor {
        self.cursor.0.take().unwrap_or_default()
    }

    fn scan(&mut self, events: &mut Vec<ParserEvent>) {
        loop {
            let cursor = self.cursor_take();
            match cursor {
                Cursor::TopLevel => {
                    if !self.scan_top_level(events) {
                        self.cursor.0 = Some(Cursor::TopLevel);
                        break;
                    }
                }
                Cursor::InsideArtifact(artifact) => {
                    if !self.scan_inside_artifact(artifact, events) {
                        break;
                    }
                }
                Cursor::InsideAction { artifact, action, raw_content } => {
                    if !self.scan_inside_action(artifact, action, raw_content, events) {
                        break;
                    }
                }
            }
        }
    }

    /// Returns `true` if progress was made and the loop should continue; `false` if the cursor
    /// was put back (waiting for more data) and `scan` should stop.
    fn scan_top_level(&mut self, events: &mut Vec<ParserEvent>) -> bool {
        let rest = &self.buffer[self.pos..];
        match rest.find(ARTIFACT_OPEN) {
            Some(rel) => {
                let text = &rest[..rel];
                if !text.is_empty() {
                    events.push(ParserEvent::TextChunk(text.to_string()));
                }
                let tag_start = self.pos + rel;
                let Some(gt_rel) = self.buffer[tag_start..].find('>') else {
                    // opening tag itself split across chunks; wait for more data, but the text
                    // before it has already been flushed so advance pos to the tag start.
                    self.pos = tag_start;
                    self.cursor.0 = Some(Cursor::TopLevel);
                    return false;
                };
                let tag_end = tag_start + gt_rel;
                let inner = &self.buffer[tag_start + ARTIFACT_OPEN.len()..tag_end];
                let attrs = tags::parse_attrs(inner);
                let artifact = Artifact {
                    id: attrs.get("id").cloned().unwrap_or_default(),
                    title: attrs.get("title").cloned().unwrap_or_default(),
                    kind: match attrs.get("type").map(String::as_str) {
                        Some("folder") => ArtifactKind::Folder,
                        _ => ArtifactKind::File,
                    },
                };
                events.push(ParserEvent::ArtifactOpen(artifact.clone()));
                self.pos = tag_end + 1;
                self.cursor.0 = Some(Cursor::InsideArtifact(artifact));
                true
            }
            None => {
                let hold = tags::partial_suffix_len(rest, ARTIFACT_OPEN);
                let flush_len = rest.len() - hold;
                if flush_len > 0 {
                    events.push(ParserEvent::TextChunk(rest[..flush_len].to_string()));
                    self.pos += flush_len;
                }
                false
            }
        }
    }

    fn scan_inside_artifact(&mut self, artifact: Artifact, events: &mut Vec<ParserEvent>) -> bool {
        let (action_idx, close_idx) = {
            let rest = &self.buffer[self.pos..];
            (rest.find(ACTION_OPEN), rest.find(ARTIFACT_CLOSE))
        };

        match (action_idx, close_idx) {
            (Some(a), Some(c)) if a <= c => self.open_action(artifact, a, events),
            (Some(a), None) => self.open_action(artifact, a, events),
            (_, Some(c)) => {
                self.pos += c + ARTIFACT_CLOSE.len();
                events.push(ParserEvent::ArtifactClose(artifact));
                true
            }
            (None, None) => {
                self.cursor.0 = Some(Cursor::InsideArtifact(artifact));
                false
            }
        }
    }

    fn open_action(&mut self, artifact: Artifact, rel: usize, events: &mut Vec<ParserEvent>) -> bool {
        let tag_start = self.pos + rel;
        let Some(gt_rel) = self.buffer[tag_start..].find('>') else {
            self.pos = tag_start;
            self.cursor.0 = Some(Cursor::InsideArtifact(artifact));
            return false;
        };
        let tag_end = tag_start + gt_rel;
        let attrs = tags::parse_attrs(&self.buffer[tag_start + ACTION_OPEN.len()..tag_end]);
        let action = match attrs.get("type").map(String::as_str) {
            Some("shell") => {
                Action::Shell { command: attrs.get("command").cloned(), content: String::new() }
            }
            _ => Action::File {
                file_path: attrs.get("filePath").cloned().unwrap_or_default(),
                operation: match attrs.get("operation").map(String::as_str) {
                    Some("update") => FileOperation::Update,
                    Some("delete") => FileOperation::Delete,
                    _ => FileOperation::Create,
                },
                content: String::new(),
            },
        };
        events.push(ParserEvent::ActionOpen(action.clone()));
        self.pos = tag_end + 1;
        self.cursor.0 = Some(Cursor::InsideAction { artifact, action, raw_content: String::new() });
        true
    }

    fn scan_inside_action(
        &mut self,
        artifact: Artifact,
        action: Action,
        mut raw_content: String,
        events: &mut Vec<ParserEvent>,
    ) -> bool {
        let rest = &self.buffer[self.pos..];
        match rest.find(ACTION_CLOSE) {
            Some(rel) => {
                let chunk = &rest[..rel];
                if !chunk.is_empty() {
                    events.push(ParserEvent::ActionStream(chunk.to_string()));
                    raw_content.push_str(chunk);
                }
                self.pos += rel + ACTION_CLOSE.len();

                let sanitized = sanitize_content(&raw_content, action.file_path());
                let finalized = finalize_shell_fallback(action.with_content(sanitized));
                events.push(ParserEvent::ActionClose(finalized));
                self.cursor.0 = Some(Cursor::InsideArtifact(artifact));
                true
            }
            None => {
                let hold = tags::partial_suffix_len(rest, ACTION_CLOSE);
                let flush_len = rest.len() - hold;
                if flush_len > 0 {
                    events.push(ParserEvent::ActionStream(rest[..flush_len].to_string()));
                    raw_content.push_str(&rest[..flush_len]);
                    self.pos += flush_len;
                }
                self.cursor.0 = Some(Cursor::InsideAction { artifact, action, raw_content });
                false
            }
        }
    }

    /// Drop the already-consumed prefix of `buffer` so long-running tasks don't hold the entire
    /// stream in memory; `pos` resets to 0 since everything before it is gone.
    fn compact(&mut self) {
        if self.pos > 0 {
            self.buffer.drain(..self.pos);
            self.pos = 0;
        }
    }
}

/// Shell-action fallback: if no `command` attribute was present but content exists, the first
/// non-empty trimmed line of the (already-sanitized) content becomes the command.
fn finalize_shell_fallback(action: Action) -> Action {
    match action {
        Action::Shell { command: None, content } => {
            let command = content.lines().map(str::trim).find(|l| !l.is_empty()).map(String::from);
            Action::Shell { command, content }
        }
        other => other,
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
