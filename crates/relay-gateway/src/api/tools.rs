//! `GET /tools` — the tool surface filtered down to what the caller may see.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Json};

use crate::auth::resolve_access_context;
use crate::state::AppState;

pub async fn list_tools(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let ctx = match resolve_access_context(&state.config.auth, &headers, None) {
        Ok(ctx) => ctx,
        Err(resp) => return resp,
    };

    let catalog = state.registry.surface();
    let surface = relay_access::filter_surface(catalog.tools.values(), &ctx);

    Json(serde_json::json!({ "tools": surface.definitions })).into_response()
}
