//! `POST /api/chat` — the non-streaming turn endpoint (spec §6). Form
//! fields: `message` (required), `session_id` (optional — omitted or
//! unknown means "start a new session"). Grounded in the teacher's
//! `api/chat.rs`, minus the SSE path and the teacher's blocking
//! `session_locks.acquire()` (spec §4.5 Open Question 1: rejected, not
//! queued).

use axum::extract::State;
use axum::Form;
use orc_domain::event::bound_batch;
use serde::Deserialize;
use serde_json::json;

use crate::api::error::ApiError;
use crate::runtime::run_turn;
use crate::runtime::turn::TurnOutcome;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatForm {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

pub async fn chat(
    State(state): State<AppState>,
    Form(form): Form<ChatForm>,
) -> Result<axum::Json<serde_json::Value>, ApiError> {
    let root_agent = state
        .root_agent()
        .ok_or_else(|| orc_domain::error::Error::Config(format!("unknown root agent '{}'", state.config.agent.root)))?;

    let session = state.sessions.resolve_or_create(form.session_id.as_deref(), "http", "orchestrator", &root_agent.name);
    let session_id = session.lock().id.clone();

    let _permit = state
        .session_locks
        .try_acquire(&session_id)
        .map_err(|_| orc_domain::error::Error::SessionBusy(session_id.clone()))?;

    let cancel = state.cancel_map.register(&session_id);
    let outcome = run_turn(&state, &session, &form.message, &cancel).await;
    state.cancel_map.remove(&session_id);

    let (response, events) = match outcome? {
        TurnOutcome::Completed { response, events } => (response, events),
        TurnOutcome::Cancelled => (String::new(), Vec::new()),
    };

    // Payload bounding (spec §4.5): no single frame over 1 MiB. The HTTP
    // body carries the same split the WS path sends as separate frames, as
    // a list of event-batches rather than one flat list.
    let event_frames = bound_batch(events);

    Ok(axum::Json(json!({
        "session_id": session_id,
        "response": response,
        "events": event_frames,
    })))
}
