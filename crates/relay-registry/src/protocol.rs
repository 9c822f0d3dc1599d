//! Wire types for the Tool-Server protocol: a plain JSON-body HTTP request,
//! no JSON-RPC envelope. Each Tool Server exposes `tools/list` and
//! `tools/call` at its configured base URL.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body sent for a `tools/list` request.
#[derive(Debug, Clone, Serialize)]
pub struct ListToolsRequest {
    pub method: &'static str,
}

impl Default for ListToolsRequest {
    fn default() -> Self {
        Self { method: "tools/list" }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListToolsResponse {
    #[serde(default)]
    pub tools: Vec<RemoteToolDef>,
}

/// A tool as declared by a single provider's `tools/list` response.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteToolDef {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_schema")]
    pub parameters: Value,
    #[serde(default)]
    pub allowed_roles: Vec<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

fn default_schema() -> Value {
    serde_json::json!({ "type": "object", "properties": {} })
}

/// Body sent for a `tools/call` request.
#[derive(Debug, Clone, Serialize)]
pub struct CallToolRequest {
    pub method: &'static str,
    pub params: CallToolParams,
}

#[derive(Debug, Clone, Serialize)]
pub struct CallToolParams {
    pub name: String,
    /// Includes the injected `access_context` sub-object (§6.1).
    pub arguments: Value,
}

impl CallToolRequest {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            method: "tools/call",
            params: CallToolParams {
                name: name.into(),
                arguments,
            },
        }
    }
}

/// The response to a `tools/call` request: either `{result}` or
/// `{error: {message, kind?}}`. Never both.
#[derive(Debug, Clone, Deserialize)]
pub struct CallToolResponse {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<ToolErrorPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolErrorPayload {
    pub message: String,
    #[serde(default)]
    pub kind: Option<String>,
}

impl CallToolResponse {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_tools_request_serializes_method_only() {
        let req = ListToolsRequest::default();
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(json, r#"{"method":"tools/list"}"#);
    }

    #[test]
    fn deserialize_tools_list_response() {
        let raw = r#"{
            "tools": [
                { "name": "lookup", "description": "look something up",
                  "parameters": {"type": "object", "properties": {"x": {"type": "string"}}},
                  "allowed_roles": ["user"] }
            ]
        }"#;
        let resp: ListToolsResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.tools.len(), 1);
        assert_eq!(resp.tools[0].name, "lookup");
        assert_eq!(resp.tools[0].allowed_roles, vec!["user".to_string()]);
    }

    #[test]
    fn tools_list_response_missing_description_defaults_empty() {
        let raw = r#"{ "tools": [{ "name": "ping" }] }"#;
        let resp: ListToolsResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.tools[0].description, "");
    }

    #[test]
    fn call_tool_request_serializes_name_and_arguments() {
        let req = CallToolRequest::new("lookup", serde_json::json!({"x": "foo"}));
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["method"], "tools/call");
        assert_eq!(json["params"]["name"], "lookup");
        assert_eq!(json["params"]["arguments"]["x"], "foo");
    }

    #[test]
    fn call_tool_response_success() {
        let raw = r#"{"result": {"value": 42}}"#;
        let resp: CallToolResponse = serde_json::from_str(raw).unwrap();
        assert!(!resp.is_error());
        assert_eq!(resp.result.unwrap()["value"], 42);
    }

    #[test]
    fn call_tool_response_error() {
        let raw = r#"{"error": {"message": "bad input", "kind": "invalid_arguments"}}"#;
        let resp: CallToolResponse = serde_json::from_str(raw).unwrap();
        assert!(resp.is_error());
        assert_eq!(resp.error.unwrap().message, "bad input");
    }
}
