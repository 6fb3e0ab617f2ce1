// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

use crate::operation::Operation;

/// `{id, operation}` as received from a client. `id` is caller-chosen and echoed back verbatim
/// on the matching response so the client can correlate out-of-order replies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: String,
    #[serde(flatten)]
    pub operation: Operation,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_flattened_operation() {
        let request: Request =
            serde_json::from_str(r#"{"id":"1","type":"stat","path":"a.txt"}"#).unwrap();
        assert_eq!(request.id, "1");
        assert_eq!(request.operation.family(), "fs");
    }
}
