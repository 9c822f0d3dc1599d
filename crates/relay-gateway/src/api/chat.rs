//! `POST /chat` — runs one turn of the planner loop and persists the
//! result (§6.2).

use std::collections::BTreeSet;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use relay_access::filter_surface;
use relay_domain::session::LineageRecord;
use relay_domain::tool::Message;

use crate::auth::resolve_access_context;
use crate::state::AppState;

/// Instructions handed to the reasoning model ahead of conversation
/// history. Deliberately static — there is no workspace or skill content
/// to assemble for this core (§1 scopes that out to the front-end).
const SYSTEM_PROMPT: &str =
    "You are an orchestration assistant. Use the available tools when they help answer the caller's question, then give a concise final answer.";

#[derive(Debug, Deserialize)]
pub struct IncomingMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequestBody {
    pub user_id: String,
    #[serde(default)]
    pub session_id: Option<String>,
    pub messages: Vec<IncomingMessage>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponseBody {
    pub session_id: String,
    pub response: String,
    pub success: bool,
    pub rounds: u32,
    pub providers_used: BTreeSet<String>,
    pub lineage: Vec<LineageRecord>,
    pub metadata: ChatResponseMetadata,
}

#[derive(Debug, Serialize)]
pub struct ChatResponseMetadata {
    pub execution_time_ms: u64,
    pub turn_id: String,
    pub timestamp: DateTime<Utc>,
}

pub async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ChatRequestBody>,
) -> impl IntoResponse {
    let ctx = match resolve_access_context(&state.config.auth, &headers, Some(&body.user_id)) {
        Ok(ctx) => ctx,
        Err(resp) => return resp,
    };

    // Only the last user message drives the turn (§6.2); prior messages in
    // the payload are assumed to already be reflected in session history.
    let Some(last_user_message) = body.messages.iter().rev().find(|m| m.role == "user") else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "messages must include at least one user message" })),
        )
            .into_response();
    };

    let session_id = body
        .session_id
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let mut conversation = vec![Message::system(SYSTEM_PROMPT)];
    if let Some(session) = state.sessions.load_session(&ctx.user_id, &session_id) {
        for turn in &session.turns {
            conversation.push(Message::user(&turn.user_message));
            conversation.push(Message::assistant(&turn.assistant_response));
        }
    }
    conversation.push(Message::user(&last_user_message.content));

    let catalog = state.registry.surface();
    let surface = filter_surface(catalog.tools.values(), &ctx);

    let result = state
        .planner
        .run_turn(&surface, state.clients.as_ref(), &ctx, conversation)
        .await;

    let metadata = result.metadata.clone();
    let turn = state.sessions.append_turn(
        &ctx.user_id,
        &session_id,
        last_user_message.content.clone(),
        result.response.clone(),
        result.success,
        metadata,
    );

    Json(ChatResponseBody {
        session_id,
        response: result.response,
        success: result.success,
        rounds: result.metadata.rounds,
        providers_used: result.metadata.providers_used,
        lineage: result.metadata.lineage,
        metadata: ChatResponseMetadata {
            execution_time_ms: result.metadata.execution_time_ms,
            turn_id: turn.turn_id,
            timestamp: turn.created_at,
        },
    })
    .into_response()
}
