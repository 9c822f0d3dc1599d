//! `POST /feedback` — upserts a rating/comment against a turn (§4.5,
//! testable property 8: last write wins, the Turn itself is untouched).

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json};
use serde::Deserialize;

use relay_domain::session::Feedback;

use crate::auth::resolve_access_context;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FeedbackBody {
    pub turn_id: String,
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
}

pub async fn submit_feedback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<FeedbackBody>,
) -> impl IntoResponse {
    if let Err(resp) = resolve_access_context(&state.config.auth, &headers, None) {
        return resp;
    }

    if !(1..=5).contains(&body.rating) {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "rating must be between 1 and 5" })),
        )
            .into_response();
    }

    state.sessions.put_feedback(Feedback {
        turn_id: body.turn_id,
        rating: body.rating,
        comment: body.comment,
        timestamp: chrono::Utc::now(),
    });

    StatusCode::NO_CONTENT.into_response()
}
