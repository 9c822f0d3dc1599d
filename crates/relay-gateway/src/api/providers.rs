//! `GET /providers` — the configured Tool Servers and their last-observed
//! health.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Json};

use crate::auth::resolve_access_context;
use crate::state::AppState;

pub async fn list_providers(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Err(resp) = resolve_access_context(&state.config.auth, &headers, None) {
        return resp;
    }

    let catalog = state.registry.surface();
    Json(serde_json::json!({ "providers": catalog.providers })).into_response()
}
