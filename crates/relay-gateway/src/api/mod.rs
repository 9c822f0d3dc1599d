pub mod chat;
pub mod feedback;
pub mod health;
pub mod providers;
pub mod sessions;
pub mod tools;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the full API router (§6.2). Each handler resolves its own
/// [`crate::auth::resolve_access_context`] rather than gating behind a
/// blanket middleware layer, since several endpoints accept no body and
/// `POST /chat` needs the body's `user_id` before a context can be built.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/chat", post(chat::chat))
        .route("/tools", get(tools::list_tools))
        .route("/providers", get(providers::list_providers))
        .route("/sessions", get(sessions::list_sessions))
        .route("/sessions/:id", get(sessions::get_session))
        .route("/feedback", post(feedback::submit_feedback))
}
