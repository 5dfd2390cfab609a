//! `GET /health` (spec §6): liveness probe, no auth, no dependency checks.

use axum::response::{IntoResponse, Json};
use serde_json::json;

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
