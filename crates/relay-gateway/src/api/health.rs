//! `GET /health` — liveness probe. Always 200; no dependency checks, no
//! auth (§6.2).

use axum::http::StatusCode;

pub async fn health() -> StatusCode {
    StatusCode::OK
}
