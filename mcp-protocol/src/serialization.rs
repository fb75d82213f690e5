//! Serialization utilities for MCP responses.
//!
//! Tool results travel as pretty-printed JSON text inside an MCP content
//! block, exactly what the agents on the other end expect to parse.

use serde_json::{json, Value};

use crate::error::McpError;

/// Render a payload as the JSON string a tool reports back.
pub fn format_response(payload: &Value) -> String {
    match serde_json::to_string_pretty(payload) {
        Ok(text) => text,
        Err(e) => json!({
            "error": "Failed to serialize response",
            "details": e.to_string()
        })
        .to_string(),
    }
}

/// Wrap a payload into an MCP `tools/call` result.
pub fn tool_text_content(payload: &Value) -> Value {
    json!({
        "content": [{
            "type": "text",
            "text": format_response(payload)
        }],
        "isError": false
    })
}

/// The `{"error": ...}` payload reported when tool logic fails. These are
/// ordinary tool results, not JSON-RPC errors, so the agent can read them.
pub fn error_payload(message: impl std::fmt::Display) -> Value {
    json!({"error": message.to_string(), "status": "error"})
}

/// Deserialize tool call arguments.
pub fn deserialize_mcp_params<T>(params: Value) -> Result<T, McpError>
where
    T: for<'de> serde::Deserialize<'de>,
{
    serde_json::from_value(params).map_err(|e| McpError::Serialization(e.to_string()))
}

/// Create a successful JSON-RPC response.
pub fn create_success_response(id: Option<Value>, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "result": result,
        "id": id
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ticktick_core::GetByIdParams;

    #[test]
    fn test_format_response_pretty_prints() {
        let text = format_response(&json!({"a": 1}));
        assert!(text.contains('\n'));
        let round_trip: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(round_trip["a"], 1);
    }

    #[test]
    fn test_tool_text_content_shape() {
        let content = tool_text_content(&json!(null));
        assert_eq!(content["content"][0]["type"], "text");
        assert_eq!(content["content"][0]["text"], "null");
        assert_eq!(content["isError"], false);
    }

    #[test]
    fn test_error_payload() {
        let payload = error_payload("Failed to create task: boom");
        assert_eq!(payload["error"], "Failed to create task: boom");
        assert_eq!(payload["status"], "error");
    }

    #[test]
    fn test_deserialize_params() {
        let params: GetByIdParams =
            deserialize_mcp_params(json!({"obj_id": "t1"})).unwrap();
        assert_eq!(params.obj_id, "t1");

        let bad: Result<GetByIdParams, _> = deserialize_mcp_params(json!({"id": "t1"}));
        assert!(bad.is_err());
    }

    #[test]
    fn test_success_response() {
        let response = create_success_response(Some(json!(1)), json!({"success": true}));
        assert_eq!(response["jsonrpc"], "2.0");
        assert_eq!(response["id"], 1);
        assert_eq!(response["result"]["success"], true);
    }
}
