//! `GET /sessions` and `GET /sessions/{id}` — session summaries and full
//! history for the caller.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json};

use crate::auth::resolve_access_context;
use crate::state::AppState;

pub async fn list_sessions(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let ctx = match resolve_access_context(&state.config.auth, &headers, None) {
        Ok(ctx) => ctx,
        Err(resp) => return resp,
    };

    Json(serde_json::json!({ "sessions": state.sessions.list_sessions(&ctx.user_id) })).into_response()
}

pub async fn get_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let ctx = match resolve_access_context(&state.config.auth, &headers, None) {
        Ok(ctx) => ctx,
        Err(resp) => return resp,
    };

    // A mismatched owner gets the same response as a nonexistent session.
    match state.sessions.load_session(&ctx.user_id, &session_id) {
        Some(session) => Json(session).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "session not found" })),
        )
            .into_response(),
    }
}
