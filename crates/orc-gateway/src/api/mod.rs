//! HTTP/WebSocket surface (spec §6). Grounded in the teacher's `api/mod.rs`
//! router assembly — merged route groups, `TraceLayer`, a `DefaultBodyLimit`
//! — trimmed to the endpoints this system actually exposes.

pub mod agent_info;
pub mod chat;
pub mod error;
pub mod health;
pub mod sessions;
pub mod tools;
pub mod ws;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/chat", post(chat::chat))
        .route("/api/sessions/", get(sessions::list_sessions))
        .route("/api/sessions/create", post(sessions::create_session))
        .route("/api/sessions/:id/rename", put(sessions::rename_session))
        .route("/api/sessions/:id", delete(sessions::delete_session))
        .route("/api/sessions/:id/reset", get(sessions::reset_session))
        .route("/api/events/:session_id", get(sessions::list_events))
        .route("/api/agent-info", get(agent_info::agent_info))
        .route("/api/tools", get(tools::list_tools))
        .route("/ws/:session_id", get(ws::ws_handler))
        .layer(DefaultBodyLimit::max(state.config.server.max_body_bytes))
        .layer(TraceLayer::new_for_http())
}
