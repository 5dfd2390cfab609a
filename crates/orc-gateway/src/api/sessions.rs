//! Session management endpoints (spec §6): list, create, rename, delete,
//! reset, and replay a session's event log. Grounded in the teacher's
//! `api/sessions.rs`, trimmed to the opaque-id model `orc-sessions` keeps
//! (no channel/peer resolution — that's the teacher's connector layer,
//! which has no counterpart here).

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;

use crate::api::error::ApiError;
use crate::state::AppState;

/// Build the metadata object returned by the create/rename endpoints:
/// `SessionSummary`'s fields plus the gateway-local display name, if set.
fn metadata(state: &AppState, id: &str, summary: Option<orc_sessions::SessionSummary>) -> serde_json::Value {
    let name = state.session_names.lock().get(id).cloned();
    match summary {
        Some(s) => json!({
            "id": s.id,
            "name": name,
            "active_agent": s.active_agent,
            "created_at": s.created_at,
            "updated_at": s.updated_at,
            "turn_count": s.turn_count,
        }),
        None => json!({ "id": id, "name": name }),
    }
}

// ── GET /api/sessions/ ──────────────────────────────────────────────

pub async fn list_sessions(State(state): State<AppState>) -> impl IntoResponse {
    let sessions: Vec<_> = state.sessions.list().into_iter().map(|s| metadata(&state, &s.id.clone(), Some(s))).collect();
    let count = sessions.len();
    Json(json!({ "sessions": sessions, "count": count }))
}

// ── POST /api/sessions/create ───────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionBody {
    #[serde(default)]
    pub name: Option<String>,
}

pub async fn create_session(
    State(state): State<AppState>,
    Json(body): Json<CreateSessionBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let root_agent = state
        .root_agent()
        .ok_or_else(|| orc_domain::error::Error::Config(format!("unknown root agent '{}'", state.config.agent.root)))?;
    let session = state.sessions.create("http", "orchestrator", &root_agent.name);
    let id = session.lock().id.clone();
    if let Some(name) = body.name {
        state.session_names.lock().insert(id.clone(), name);
    }
    Ok(Json(metadata(&state, &id, None)))
}

// ── PUT /api/sessions/{id}/rename ───────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RenameSessionBody {
    pub name: String,
}

pub async fn rename_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<RenameSessionBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .sessions
        .get(&id)
        .ok_or_else(|| orc_domain::error::Error::UnknownResource(format!("session '{id}'")))?;
    state.session_names.lock().insert(id.clone(), body.name);
    Ok(Json(metadata(&state, &id, None)))
}

// ── DELETE /api/sessions/{id} ───────────────────────────────────────

pub async fn delete_session(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<serde_json::Value>, ApiError> {
    state.sessions.remove(&id)?;
    state.session_names.lock().remove(&id);
    Ok(Json(json!({ "status": "deleted" })))
}

// ── GET /api/sessions/{id}/reset ─────────────────────────────────────

/// Clears the session's transcript and event log in place; the session id
/// and its runner survive the reset (spec §4.5: "session id is opaque but
/// must be stable across reconnects").
pub async fn reset_session(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<serde_json::Value>, ApiError> {
    state.sessions.reset(&id)?;
    Ok(Json(json!({ "status": "reset", "session_id": id })))
}

// ── GET /api/events/{session_id} ────────────────────────────────────

pub async fn list_events(State(state): State<AppState>, Path(session_id): Path<String>) -> Result<Json<serde_json::Value>, ApiError> {
    let session = state
        .sessions
        .get(&session_id)
        .ok_or_else(|| orc_domain::error::Error::UnknownResource(format!("session '{session_id}'")))?;
    let guard = session.lock();
    // Payload bounding (spec §4.5): split the replayed tail into frames no
    // larger than 1 MiB each, same as a live WS replay would.
    let event_frames = guard.events.tail_framed(guard.events.len());
    Ok(Json(json!({ "session_id": session_id, "events": event_frames })))
}
