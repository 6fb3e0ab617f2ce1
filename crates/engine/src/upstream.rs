// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The upstream streaming call (§4.H.3-4): POST the file map and conversation to the target LLM
//! server, then drive `RawWriter` (persistence) and `StreamParser` (tag extraction) off the same
//! byte stream. `reqwest::Response::chunk` is used directly rather than its `Stream` adapter, so
//! this module needs no extra `futures` dependency beyond what the workspace already carries.

use std::time::Duration;

use agent8_core::Breadcrumb;
use agent8_parser::{ParserEvent, StreamParser};
use agent8_storage::RawWriter;
use serde_json::json;
use tokio::sync::mpsc;

use crate::error::EngineError;
use crate::filemap::FileMapEntry;

#[derive(Debug, Clone)]
pub struct UpstreamPayload {
    pub messages: serde_json::Value,
    pub files: Vec<FileMapEntry>,
    pub prompt_id: Option<String>,
    pub context_optimization: Option<bool>,
    pub mcp_context: Option<serde_json::Value>,
}

/// POST `payload` to `target_server_url`, then stream the response body: each chunk is appended
/// to `writer` and fed to `parser`, with every resulting `ParserEvent` pushed onto `events_tx` as
/// it becomes available — so a concurrent consumer can drive the Action Runner in real time
/// rather than waiting for the whole stream to finish. A gap between chunks longer than
/// `inactivity_budget` or a non-2xx status is fatal. `events_tx` is taken by value so it is
/// dropped (closing the channel) the moment this function returns, letting the consumer side
/// of the channel observe end-of-stream without a separate signal.
pub async fn stream_upstream(
    client: &reqwest::Client,
    target_server_url: &str,
    task_token: &str,
    payload: &UpstreamPayload,
    inactivity_budget: Duration,
    writer: &mut RawWriter,
    parser: &StreamParser,
    message_id: &str,
    events_tx: mpsc::UnboundedSender<ParserEvent>,
) -> Result<(), EngineError> {
    let body = build_body(payload);

    let mut response = client
        .post(target_server_url)
        .header(reqwest::header::COOKIE, format!("task_token={task_token}"))
        .json(&body)
        .send()
        .await
        .map_err(|err| EngineError::Upstream(Breadcrumb::new("upstream", "request", err.to_string())))?;

    if !response.status().is_success() {
        return Err(EngineError::Upstream(Breadcrumb::new(
            "upstream",
            "response",
            format!("upstream returned {}", response.status()),
        )));
    }

    // A multi-byte UTF-8 character has no obligation to land within a single HTTP chunk, so any
    // trailing bytes that don't yet form complete characters are held here and prepended to the
    // next chunk before decoding, rather than being lossily replaced on their own.
    let mut pending = Vec::new();

    loop {
        let chunk = tokio::time::timeout(inactivity_budget, response.chunk())
            .await
            .map_err(|_| {
                EngineError::Upstream(Breadcrumb::new("upstream", "stream", "inactivity budget exceeded"))
            })?
            .map_err(|err| EngineError::Upstream(Breadcrumb::new("upstream", "stream", err.to_string())))?;

        let Some(bytes) = chunk else { break };
        writer.append(&bytes).await?;

        let text = decode_chunk(&mut pending, &bytes);

        for event in parser.feed(message_id, &text) {
            // The receiver only disappears once the task driver has stopped listening (e.g. on
            // its own fatal error); dropping further events at that point is correct.
            let _ = events_tx.send(event);
        }
    }

    if !pending.is_empty() {
        // End of stream with a still-incomplete trailing sequence: the upstream response is
        // truncated mid-character, so there is no further chunk to complete it. Decode lossily
        // rather than silently dropping the bytes.
        let text = String::from_utf8_lossy(&pending).into_owned();
        for event in parser.feed(message_id, &text) {
            let _ = events_tx.send(event);
        }
    }

    Ok(())
}

/// Append `bytes` to `pending` and return the longest valid-UTF-8 prefix as a `String`, leaving
/// any still-incomplete trailing sequence in `pending` for the next call. Splitting a multi-byte
/// character across two HTTP chunks is ordinary, not an edge case.
fn decode_chunk(pending: &mut Vec<u8>, bytes: &[u8]) -> String {
    pending.extend_from_slice(bytes);
    match std::str::from_utf8(pending) {
        Ok(text) => {
            let text = text.to_string();
            pending.clear();
            text
        }
        Err(err) => {
            let valid_up_to = err.valid_up_to();
            let text =
                String::from_utf8(pending[..valid_up_to].to_vec()).expect("valid_up_to bounds a valid UTF-8 prefix");
            pending.drain(..valid_up_to);
            text
        }
    }
}

/// Build the `{messages, files, promptId?, contextOptimization?, mcpContext?}` request body per
/// §6's Task creation shape. Factored out so the payload shape is unit-testable without a server.
fn build_body(payload: &UpstreamPayload) -> serde_json::Value {
    json!({
        "messages": payload.messages,
        "files": payload.files.iter().map(|f| json!({ "path": f.path, "content": f.content })).collect::<Vec<_>>(),
        "promptId": payload.prompt_id,
        "contextOptimization": payload.context_optimization,
        "mcpContext": payload.mcp_context,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_body_maps_file_entries_to_path_and_content() {
        let payload = UpstreamPayload {
            messages: json!([{"role": "user", "content": "hi"}]),
            files: vec![FileMapEntry { path: "a.rs".to_string(), content: "fn a() {}".to_string() }],
            prompt_id: Some("p-1".to_string()),
            context_optimization: Some(true),
            mcp_context: None,
        };
        let body = build_body(&payload);
        assert_eq!(body["files"][0]["path"], "a.rs");
        assert_eq!(body["files"][0]["content"], "fn a() {}");
        assert_eq!(body["promptId"], "p-1");
        assert_eq!(body["contextOptimization"], true);
    }

    #[test]
    fn decode_chunk_buffers_a_multi_byte_character_split_across_chunks() {
        let snowman = "\u{2603}".as_bytes(); // 3 bytes: 0xE2 0x98 0x83
        let mut pending = Vec::new();

        let first = decode_chunk(&mut pending, &snowman[..2]);
        assert_eq!(first, "");
        assert_eq!(pending.len(), 2);

        let second = decode_chunk(&mut pending, &snowman[2..]);
        assert_eq!(second, "\u{2603}");
        assert!(pending.is_empty());
    }

    #[test]
    fn decode_chunk_passes_through_ascii_immediately() {
        let mut pending = Vec::new();
        assert_eq!(decode_chunk(&mut pending, b"hello "), "hello ");
        assert_eq!(decode_chunk(&mut pending, b"world"), "world");
        assert!(pending.is_empty());
    }
}
