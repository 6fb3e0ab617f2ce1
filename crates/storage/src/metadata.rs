// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `<taskId>.json`: the metadata envelope describing the upstream request/response this task's
//! `.raw` file was captured from.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Byte/line counters accumulated while streaming the upstream response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamCounters {
    pub bytes_received: u64,
    pub text_frames: u64,
    pub artifacts: u64,
    pub actions: u64,
}

/// Timing markers for the upstream call, recorded in wall-clock UTC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamTiming {
    pub requested_at: DateTime<Utc>,
    pub first_byte_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// The request/response envelope written to `<taskId>.json`. Headers are stored with any
/// `Authorization`/cookie values already masked — this file is diagnostic, not a credential
/// store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskMetadata {
    pub request_headers: HashMap<String, String>,
    pub response_status: Option<u16>,
    pub counters: StreamCounters,
    pub timing: StreamTiming,
}

impl TaskMetadata {
    pub fn started(requested_at: DateTime<Utc>, request_headers: HashMap<String, String>) -> Self {
        Self {
            request_headers: mask_sensitive_headers(request_headers),
            response_status: None,
            counters: StreamCounters::default(),
            timing: StreamTiming { requested_at, first_byte_at: None, completed_at: None },
        }
    }
}

/// Mask header values whose key case-insensitively matches a known sensitive name, so the
/// metadata envelope never carries a bearer token or session cookie to disk in the clear.
fn mask_sensitive_headers(headers: HashMap<String, String>) -> HashMap<String, String> {
    const SENSITIVE: &[&str] = &["authorization", "cookie", "set-cookie", "x-api-key"];
    headers
        .into_iter()
        .map(|(k, v)| {
            if SENSITIVE.contains(&k.to_ascii_lowercase().as_str()) {
                (k, "***".to_string())
            } else {
                (k, v)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_authorization_header_case_insensitively() {
        let mut headers = HashMap::new();
        headers.insert("Authorization".to_string(), "Bearer secret".to_string());
        headers.insert("X-Request-Id".to_string(), "abc".to_string());
        let meta = TaskMetadata::started(Utc::now(), headers);
        assert_eq!(meta.request_headers.get("Authorization").map(String::as_str), Some("***"));
        assert_eq!(meta.request_headers.get("X-Request-Id").map(String::as_str), Some("abc"));
    }
}
