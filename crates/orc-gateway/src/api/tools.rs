//! `GET /api/tools` (spec §6): list every descriptor the root agent's
//! toolsets resolve to, for dashboard display. Grounded in the teacher's
//! `api/tools.rs` dispatch machinery, trimmed to the read-only listing spec
//! §6 asks for — execution happens inside the turn loop, not over HTTP.

use axum::extract::State;
use axum::response::Json;
use serde_json::json;

use crate::api::error::ApiError;
use crate::runtime::agent::tool_definitions_for;
use crate::state::AppState;

pub async fn list_tools(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let root_agent = state
        .root_agent()
        .ok_or_else(|| orc_domain::error::Error::Config(format!("unknown root agent '{}'", state.config.agent.root)))?;

    let mut tools: Vec<_> = tool_definitions_for(&state.tools, &state.transfer, &root_agent)
        .into_iter()
        .map(|t| {
            json!({
                "name": t.name,
                "description": t.description,
                "input_schema": t.parameters,
            })
        })
        .collect();
    tools.sort_by(|a, b| a["name"].as_str().cmp(&b["name"].as_str()));
    Ok(Json(json!({ "tools": tools })))
}
