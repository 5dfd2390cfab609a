//! `GET /api/agent-info` (spec §6): the root agent's name/model plus a
//! per-agent model map, so a dashboard can show what's configured without
//! needing the full agent hierarchy.

use axum::extract::State;
use axum::response::{IntoResponse, Json};
use serde_json::json;

use crate::state::AppState;

pub async fn agent_info(State(state): State<AppState>) -> impl IntoResponse {
    let agent_models: serde_json::Map<String, serde_json::Value> = state
        .config
        .agent
        .agents
        .iter()
        .map(|(name, def)| {
            let model = def.model.clone().unwrap_or_else(|| state.config.agent.model.clone());
            (name.clone(), json!(model))
        })
        .collect();

    Json(json!({
        "agent_name": state.config.agent.root,
        "model": state.config.agent.model,
        "agent_models": agent_models,
    }))
}
