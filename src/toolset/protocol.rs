//! JSON-RPC wire types for the remote tool-set protocol.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Outgoing JSON-RPC request. Notifications carry no `id`.
#[derive(Debug, Serialize)]
pub struct RpcRequest {
    pub jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl RpcRequest {
    pub fn call(id: u64, method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id: Some(id),
            method: method.into(),
            params: Some(params),
        }
    }

    pub fn notification(method: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id: None,
            method: method.into(),
            params: None,
        }
    }
}

/// Incoming JSON-RPC response.
#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    #[allow(dead_code)]
    pub id: Option<Value>,
    pub result: Option<Value>,
    pub error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

/// Result of `tools/list`.
#[derive(Debug, Deserialize)]
pub struct ToolsListResult {
    pub tools: Vec<ToolDescriptor>,
}

/// A tool advertised by the remote tool-set.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_schema")]
    pub input_schema: Value,
}

fn default_schema() -> Value {
    serde_json::json!({"type": "object"})
}

/// Result of `tools/call`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub is_error: bool,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

impl CallToolResult {
    /// Concatenate the text content blocks into one string result.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter(|b| b.kind == "text")
            .filter_map(|b| b.text.as_deref())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Extract the first `data:` payload from an SSE body.
///
/// The streaming endpoint answers each POST with a short event stream whose
/// first data event carries the JSON-RPC response.
pub fn first_sse_data(body: &str) -> Option<String> {
    let mut data_lines: Vec<&str> = Vec::new();

    for line in body.lines() {
        let line = line.trim_end_matches('\r');
        if let Some(rest) = line.strip_prefix("data:") {
            data_lines.push(rest.strip_prefix(' ').unwrap_or(rest));
        } else if line.is_empty() && !data_lines.is_empty() {
            // Blank line terminates the event.
            break;
        }
    }

    if data_lines.is_empty() {
        None
    } else {
        Some(data_lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_call_request_serializes_with_id() {
        let request = RpcRequest::call(7, "tools/list", json!({}));
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["id"], 7);
        assert_eq!(value["method"], "tools/list");
    }

    #[test]
    fn test_notification_omits_id() {
        let request = RpcRequest::notification("notifications/initialized");
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("id").is_none());
        assert!(value.get("params").is_none());
    }

    #[test]
    fn test_tool_descriptor_defaults_schema() {
        let descriptor: ToolDescriptor =
            serde_json::from_value(json!({"name": "lookup"})).unwrap();
        assert_eq!(descriptor.name, "lookup");
        assert_eq!(descriptor.input_schema["type"], "object");
    }

    #[test]
    fn test_call_result_text_joins_blocks() {
        let result: CallToolResult = serde_json::from_value(json!({
            "content": [
                {"type": "text", "text": "row 1"},
                {"type": "image", "data": "…"},
                {"type": "text", "text": "row 2"}
            ]
        }))
        .unwrap();
        assert_eq!(result.text(), "row 1\nrow 2");
        assert!(!result.is_error);
    }

    #[test]
    fn test_first_sse_data_single_event() {
        let body = "event: message\ndata: {\"id\":1}\n\n";
        assert_eq!(first_sse_data(body).unwrap(), "{\"id\":1}");
    }

    #[test]
    fn test_first_sse_data_multiline() {
        let body = "data: {\"a\":\ndata: 1}\n\ndata: ignored\n\n";
        assert_eq!(first_sse_data(body).unwrap(), "{\"a\":\n1}");
    }

    #[test]
    fn test_first_sse_data_empty() {
        assert!(first_sse_data(": keep-alive\n\n").is_none());
    }
}
