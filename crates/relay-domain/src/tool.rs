use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A tool schema as discovered from a single provider's `tools/list` call.
///
/// `name` is expected to be unique across the whole registry; collisions
/// are resolved last-loaded-wins and logged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub provider_id: String,
    pub description: String,
    /// JSON Schema describing the tool's argument shape.
    pub parameters: serde_json::Value,
    /// Roles allowed to see/invoke this tool. Empty means no role gate —
    /// still subject to dev-mode / admin bypass in the access filter.
    #[serde(default)]
    pub allowed_roles: HashSet<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl ToolSchema {
    pub fn is_valid(&self) -> bool {
        !self.name.is_empty() && !self.parameters.is_null()
    }
}

/// Internal tool call format (provider-agnostic).
/// Every adapter converts provider-specific tool calls to/from this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub call_id: String,
    pub tool_name: String,
    pub arguments: serde_json::Value,
}

/// Tool definition exposed to the reasoning model — the provider and role
/// gate from [`ToolSchema`] are stripped, only name/description/parameters
/// survive into the function-calling surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema for the tool's parameters.
    pub parameters: serde_json::Value,
}

impl From<&ToolSchema> for ToolDefinition {
    fn from(schema: &ToolSchema) -> Self {
        ToolDefinition {
            name: schema.name.clone(),
            description: schema.description.clone(),
            parameters: schema.parameters.clone(),
        }
    }
}

/// A message in the conversation (provider-agnostic).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool_use")]
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    #[serde(rename = "tool_result")]
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default)]
        is_error: bool,
    },
    #[serde(rename = "image")]
    Image {
        url: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        media_type: Option<String>,
    },
}

// ── Convenience constructors ───────────────────────────────────────

impl Message {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: MessageContent::Text(text.into()),
        }
    }
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(text.into()),
        }
    }
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: MessageContent::Text(text.into()),
        }
    }
    pub fn tool_result(tool_use_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: MessageContent::Parts(vec![ContentPart::ToolResult {
                tool_use_id: tool_use_id.into(),
                content: content.into(),
                is_error: false,
            }]),
        }
    }

    /// Same as [`Message::tool_result`] but marks the result as a failure —
    /// used by the invoker to thread a tool-call-scoped error back into the
    /// transcript instead of raising.
    pub fn tool_error_result(tool_use_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: MessageContent::Parts(vec![ContentPart::ToolResult {
                tool_use_id: tool_use_id.into(),
                content: content.into(),
                is_error: true,
            }]),
        }
    }

    /// Build the assistant message announcing tool calls, used to
    /// re-assemble the canonical conversation prefix before the next round.
    pub fn assistant_tool_calls(text: &str, calls: &[ToolCall]) -> Self {
        let mut parts = Vec::new();
        if !text.is_empty() {
            parts.push(ContentPart::Text {
                text: text.to_string(),
            });
        }
        for c in calls {
            parts.push(ContentPart::ToolUse {
                id: c.call_id.clone(),
                name: c.tool_name.clone(),
                input: c.arguments.clone(),
            });
        }
        Self {
            role: Role::Assistant,
            content: MessageContent::Parts(parts),
        }
    }
}

impl MessageContent {
    /// Extract the plain-text content (first text part, or the full text).
    pub fn text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(t) => Some(t.as_str()),
            MessageContent::Parts(parts) => parts.iter().find_map(|p| match p {
                ContentPart::Text { text } => Some(text.as_str()),
                _ => None,
            }),
        }
    }

    /// Extract and join all text content, returning an owned String.
    ///
    /// For `Text` variant, returns the string directly.
    /// For `Parts` variant, joins all `Text` parts with `"\n"`.
    /// Non-text parts (ToolUse, ToolResult, Image) are skipped.
    pub fn extract_all_text(&self) -> String {
        match self {
            MessageContent::Text(t) => t.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|p| match p {
                    ContentPart::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_all_text_from_text_variant() {
        let content = MessageContent::Text("hello world".into());
        assert_eq!(content.extract_all_text(), "hello world");
    }

    #[test]
    fn extract_all_text_from_parts_joins_with_newline() {
        let content = MessageContent::Parts(vec![
            ContentPart::Text { text: "line one".into() },
            ContentPart::ToolUse {
                id: "c1".into(),
                name: "exec".into(),
                input: serde_json::json!({}),
            },
            ContentPart::Text { text: "line two".into() },
        ]);
        assert_eq!(content.extract_all_text(), "line one\nline two");
    }

    #[test]
    fn extract_all_text_empty_parts() {
        let content = MessageContent::Parts(vec![]);
        assert_eq!(content.extract_all_text(), "");
    }

    #[test]
    fn tool_schema_requires_name_and_parameters() {
        let mut schema = ToolSchema {
            name: "lookup".into(),
            provider_id: "alpha".into(),
            description: String::new(),
            parameters: serde_json::json!({"type": "object"}),
            allowed_roles: HashSet::new(),
            metadata: None,
        };
        assert!(schema.is_valid());
        schema.name.clear();
        assert!(!schema.is_valid());
    }

    #[test]
    fn tool_definition_strips_provider_and_roles() {
        let mut roles = HashSet::new();
        roles.insert("admin".to_string());
        let schema = ToolSchema {
            name: "lookup".into(),
            provider_id: "alpha".into(),
            description: "looks things up".into(),
            parameters: serde_json::json!({"type": "object"}),
            allowed_roles: roles,
            metadata: None,
        };
        let def: ToolDefinition = (&schema).into();
        assert_eq!(def.name, "lookup");
        assert_eq!(def.description, "looks things up");
    }

    #[test]
    fn assistant_tool_calls_includes_text_and_uses() {
        let calls = vec![ToolCall {
            call_id: "t1".into(),
            tool_name: "a".into(),
            arguments: serde_json::json!({}),
        }];
        let msg = Message::assistant_tool_calls("thinking...", &calls);
        match msg.content {
            MessageContent::Parts(parts) => assert_eq!(parts.len(), 2),
            _ => panic!("expected parts"),
        }
    }

    #[test]
    fn tool_error_result_sets_is_error() {
        let msg = Message::tool_error_result("t1", "boom");
        match msg.content {
            MessageContent::Parts(parts) => match &parts[0] {
                ContentPart::ToolResult { is_error, .. } => assert!(*is_error),
                _ => panic!("expected tool result"),
            },
            _ => panic!("expected parts"),
        }
    }
}
