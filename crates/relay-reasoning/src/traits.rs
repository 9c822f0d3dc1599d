use relay_domain::error::Result;
use relay_domain::tool::{Message, ToolCall, ToolDefinition};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request / Response types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A function-calling chat completion request — the conversation plus the
/// tool surface the model may invoke.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Model identifier override. When `None`, the adapter uses its default.
    pub model: Option<String>,
}

/// A function-calling chat completion response. Per the pure-function
/// framing in design notes, this never carries partial/streamed state —
/// it is the round's final assistant turn.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: String,
    /// Tool calls emitted by the model, `call_id` preserved verbatim.
    pub tool_calls: Vec<ToolCall>,
    pub model: String,
    pub finish_reason: Option<String>,
}

impl ChatResponse {
    pub fn requests_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Core adapter trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Treated by the Planner Loop as a pure function `(conversation,
/// tool_surface) → (assistant_message, tool_call_directives?)`. The only
/// coupling to the underlying model's wire protocol is preserving
/// `tool_call_id` verbatim on the way back in.
#[async_trait::async_trait]
pub trait ReasoningModel: Send + Sync {
    async fn complete(&self, req: ChatRequest) -> Result<ChatResponse>;

    /// A unique identifier for this adapter instance.
    fn provider_id(&self) -> &str;
}
