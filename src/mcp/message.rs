// Copyright 2026 ContextGuard Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! JSON-RPC message model.
//!
//! The gateway treats any syntactically valid JSON value as a message and
//! consults only the envelope fields it needs for dispatch: `jsonrpc`,
//! `id`, `method`, `params`, `result`, `error`. Anything stricter would
//! break the transparency requirement, since opaque frames must be
//! forwarded unchanged.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::engine_core::constants::{blocking, jsonrpc};

/// Classification by envelope shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Has `method` and an `id`.
    Request,
    /// Has `method` but no `id`.
    Notification,
    /// Has `result` or `error`.
    Response,
    /// Valid JSON that matches none of the above.
    Opaque,
}

/// A parsed JSON-RPC envelope. Field access never fails; absent fields
/// read as `None`.
#[derive(Debug, Clone)]
pub struct McpMessage {
    value: Value,
}

impl McpMessage {
    /// Parse a frame's bytes. `None` means the frame stays opaque.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        serde_json::from_slice(bytes).ok().map(|value| Self { value })
    }

    pub fn kind(&self) -> MessageKind {
        if self.method().is_some() {
            if self.has_id() {
                MessageKind::Request
            } else {
                MessageKind::Notification
            }
        } else if self.value.get("result").is_some() || self.value.get("error").is_some() {
            MessageKind::Response
        } else {
            MessageKind::Opaque
        }
    }

    pub fn method(&self) -> Option<&str> {
        self.value.get("method").and_then(Value::as_str)
    }

    /// Whether the envelope carries an `id` key at all. A literal `null`
    /// id still counts: the peer expects it echoed back.
    pub fn has_id(&self) -> bool {
        self.value.get("id").is_some()
    }

    pub fn id(&self) -> Option<&Value> {
        self.value.get("id")
    }

    /// The `jsonrpc` version marker, defaulting to "2.0" when absent so
    /// synthetic responses are always well-formed.
    pub fn jsonrpc(&self) -> Value {
        self.value
            .get("jsonrpc")
            .cloned()
            .unwrap_or_else(|| Value::String("2.0".to_string()))
    }

    pub fn params(&self) -> Option<&Value> {
        self.value.get("params")
    }

    pub fn result(&self) -> Option<&Value> {
        self.value.get("result")
    }

    /// Serialized parameters, exactly as the policy checks must see them.
    pub fn params_text(&self) -> String {
        match self.params() {
            Some(params) => params.to_string(),
            None => "{}".to_string(),
        }
    }

    /// The response payload subject to the leak scan: `result` when
    /// present, otherwise the whole envelope.
    pub fn response_scan_text(&self) -> String {
        match self.result() {
            Some(result) => result.to_string(),
            None => self.value.to_string(),
        }
    }

    /// `params.name` of a `tools/call` request.
    pub fn tool_name(&self) -> Option<&str> {
        self.params()?.get("name").and_then(Value::as_str)
    }

    /// Candidate file-path parameters, in the fixed inspection order,
    /// keeping only string values.
    pub fn path_candidates(&self) -> Vec<&str> {
        let params = match self.params() {
            Some(p) => p,
            None => return Vec::new(),
        };
        let arguments = params.get("arguments");
        let lookups = [
            arguments.and_then(|a| a.get("path")),
            arguments.and_then(|a| a.get("filePath")),
            arguments.and_then(|a| a.get("file")),
            arguments.and_then(|a| a.get("directory")),
            params.get("path"),
            params.get("filePath"),
        ];
        lookups
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
            .collect()
    }

    pub fn as_value(&self) -> &Value {
        &self.value
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// A gateway-manufactured error response. Field order matches the wire
/// contract: `jsonrpc`, `id`, `error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntheticResponse {
    pub jsonrpc: Value,
    pub id: Value,
    pub error: JsonRpcError,
}

impl SyntheticResponse {
    fn build(original: &McpMessage, code: i32, message: &str, violations: &[String]) -> Self {
        Self {
            jsonrpc: original.jsonrpc(),
            id: original.id().cloned().unwrap_or(Value::Null),
            error: JsonRpcError {
                code,
                message: message.to_string(),
                data: Some(serde_json::json!({ "violations": violations })),
            },
        }
    }

    /// `-32000`: request blocked by policy.
    pub fn request_blocked(original: &McpMessage, violations: &[String]) -> Self {
        Self::build(
            original,
            jsonrpc::ERROR_REQUEST_BLOCKED,
            blocking::REQUEST_BLOCKED_MESSAGE,
            violations,
        )
    }

    /// `-32001`: response blocked by policy.
    pub fn response_blocked(original: &McpMessage, violations: &[String]) -> Self {
        Self::build(
            original,
            jsonrpc::ERROR_RESPONSE_BLOCKED,
            blocking::RESPONSE_BLOCKED_MESSAGE,
            violations,
        )
    }

    /// Serialize as one wire line.
    pub fn to_wire(&self) -> Bytes {
        let mut line = serde_json::to_string(self).unwrap_or_else(|_| {
            // Serialization of these plain data types cannot fail; keep the
            // stream alive regardless.
            String::from("{\"jsonrpc\":\"2.0\",\"id\":null,\"error\":{\"code\":-32603,\"message\":\"Internal error\"}}")
        });
        line.push('\n');
        Bytes::from(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> McpMessage {
        McpMessage::parse(s.as_bytes()).unwrap()
    }

    #[test]
    fn classifies_by_envelope_shape() {
        assert_eq!(
            parse(r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#).kind(),
            MessageKind::Request
        );
        assert_eq!(
            parse(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).kind(),
            MessageKind::Notification
        );
        assert_eq!(
            parse(r#"{"jsonrpc":"2.0","id":1,"result":{}}"#).kind(),
            MessageKind::Response
        );
        assert_eq!(parse(r#"{"unrelated":true}"#).kind(), MessageKind::Opaque);
    }

    #[test]
    fn malformed_json_is_not_a_message() {
        assert!(McpMessage::parse(b"hello world").is_none());
        assert!(McpMessage::parse(b"{truncated").is_none());
    }

    #[test]
    fn path_candidates_follow_the_fixed_order() {
        let msg = parse(
            r#"{"method":"tools/call","params":{"name":"t","path":"/p5","filePath":"/p6",
                "arguments":{"path":"/p1","filePath":"/p2","file":"/p3","directory":"/p4","depth":3}}}"#,
        );
        assert_eq!(
            msg.path_candidates(),
            vec!["/p1", "/p2", "/p3", "/p4", "/p5", "/p6"]
        );
    }

    #[test]
    fn non_string_path_candidates_are_ignored() {
        let msg = parse(r#"{"method":"tools/call","params":{"arguments":{"path":42}}}"#);
        assert!(msg.path_candidates().is_empty());
    }

    #[test]
    fn response_scan_prefers_result() {
        let msg = parse(r#"{"jsonrpc":"2.0","id":1,"result":{"content":"x"}}"#);
        assert_eq!(msg.response_scan_text(), r#"{"content":"x"}"#);
        let msg = parse(r#"{"jsonrpc":"2.0","method":"ping"}"#);
        assert!(msg.response_scan_text().contains("ping"));
    }

    #[test]
    fn synthetic_error_wire_shape() {
        let msg = parse(r#"{"jsonrpc":"2.0","id":7,"method":"tools/call"}"#);
        let violations = vec!["Path traversal attempt detected: ../x".to_string()];
        let wire = SyntheticResponse::request_blocked(&msg, &violations).to_wire();
        let text = std::str::from_utf8(&wire).unwrap();
        assert!(text.ends_with('\n'));
        assert!(text.starts_with(r#"{"jsonrpc":"2.0","id":7,"error":{"code":-32000,"#));
        assert!(text.contains(r#""message":"Security violation: Request blocked""#));
        assert!(text.contains("Path traversal attempt detected"));
    }

    #[test]
    fn synthetic_error_echoes_string_ids() {
        let msg = parse(r#"{"jsonrpc":"2.0","id":"abc-1","result":"sk-aaaaaaaaaaaaaaaaaaaaaaaa"}"#);
        let resp = SyntheticResponse::response_blocked(&msg, &["v".to_string()]);
        assert_eq!(resp.id, Value::String("abc-1".to_string()));
        assert_eq!(resp.error.code, -32001);
    }
}
