// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `{code, message}` — the body of a failed response. `code` is always one of the fixed strings
/// from the error taxonomy (`FILESYSTEM_OPERATION_FAILED`, `SPAWN_ERROR`, ...), never free-form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseError {
    pub code: String,
    pub message: String,
}

impl ResponseError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self { code: code.into(), message: message.into() }
    }
}

/// `{id, success, data?, error?}` — exactly one response per request, correlated by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,
}

impl Response {
    pub fn ok(id: impl Into<String>, data: impl Serialize) -> Self {
        Self {
            id: id.into(),
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
        }
    }

    pub fn ok_empty(id: impl Into<String>) -> Self {
        Self { id: id.into(), success: true, data: None, error: None }
    }

    pub fn err(id: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            success: false,
            data: None,
            error: Some(ResponseError::new(code, message)),
        }
    }
}
