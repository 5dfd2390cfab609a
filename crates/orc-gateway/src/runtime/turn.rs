//! The turn loop (spec §4.5 Turn protocol): accept user text, hand it to
//! the session's active agent, consume the model/tool exchange until a
//! final response, and hand back the normalized event list.

use std::sync::Arc;

use orc_domain::error::{Error, Result};
use orc_domain::event::{Event, EventCategory, EventEnvelope, TransferStatus};
use orc_domain::tool::Message;
use orc_providers::ChatRequest;
use orc_sessions::{Role as TurnRole, Session};
use parking_lot::Mutex;

use crate::runtime::cancel::CancelToken;
use crate::runtime::tools::{dispatch, Dispatch};
use crate::runtime::{agent, build_assistant_tool_message, transcript_to_messages};
use crate::state::AppState;

/// Fallback tool-loop bound used only if `agent.max_transfer_depth` is
/// somehow zero; the configured value (spec §5, default 8) is the real
/// bound used by `run_turn`.
pub const MAX_TOOL_LOOPS: u32 = 10;

/// What a turn produced.
pub enum TurnOutcome {
    Completed { response: String, events: Vec<Event> },
    /// The session's lock was released early because the client
    /// disconnected or cancelled; no assistant turn was appended.
    Cancelled,
}

pub async fn run_turn(
    state: &AppState,
    session: &Arc<Mutex<Session>>,
    user_text: &str,
    cancel: &CancelToken,
) -> Result<TurnOutcome> {
    let (active_agent_name, history) = {
        let mut guard = session.lock();
        state.sessions.record_turn(&mut guard, TurnRole::User, user_text, None)?;
        (guard.active_agent.clone(), guard.turns.clone())
    };

    let mut current_agent = agent::resolve(&state.transfer, &active_agent_name)?;
    let mut messages = transcript_to_messages(&current_agent.instruction, &history);
    let mut events: Vec<Event> = Vec::new();
    let mut loops = 0u32;
    let max_loops = if state.config.agent.max_transfer_depth > 0 {
        state.config.agent.max_transfer_depth
    } else {
        MAX_TOOL_LOOPS
    };

    let final_text = loop {
        if cancel.is_cancelled() {
            return Ok(TurnOutcome::Cancelled);
        }

        let tool_defs = agent::tool_definitions_for(&state.tools, &state.transfer, &current_agent);
        let (provider, model_name) = state.llm.resolve(&current_agent.model)?;
        let response = provider
            .chat(ChatRequest {
                messages: messages.clone(),
                tools: tool_defs,
                temperature: None,
                max_tokens: None,
                json_mode: false,
                model: Some(model_name.to_string()),
            })
            .await?;

        if response.tool_calls.is_empty() {
            break response.content;
        }

        if loops >= max_loops {
            tracing::warn!(session = %session.lock().id, loops, max_loops, "transfer-depth limit exceeded");
            let mut error_event = Event::ModelResponse {
                envelope: envelope(EventCategory::ModelResponse, "transfer-depth limit exceeded".to_string()),
                text: format!("exceeded max_transfer_depth ({max_loops}) without a final response"),
                is_final: true,
                agent_name: Some(current_agent.name.clone()),
            };
            error_event.truncate_text();
            let mut guard = session.lock();
            guard.active_agent = current_agent.name.clone();
            push_deduped(&mut guard, error_event);
            return Err(Error::Internal(format!(
                "transfer-depth limit ({max_loops}) exceeded without a final response"
            )));
        }
        loops += 1;

        messages.push(build_assistant_tool_message(&response.content, &response.tool_calls));

        if cancel.is_cancelled() {
            return Ok(TurnOutcome::Cancelled);
        }

        // Run this batch concurrently but emit events in call order, not
        // completion order (spec §4.5).
        let dispatches = futures_util::future::join_all(
            response
                .tool_calls
                .iter()
                .map(|call| dispatch(&state.tools, &state.config.tools, &state.transfer, &current_agent.name, call)),
        )
        .await;

        for (call, outcome) in response.tool_calls.iter().zip(dispatches) {
            match outcome {
                Dispatch::Tool { output } => {
                    let (result_text, error) = match &output {
                        Ok(v) => (v.to_string(), None),
                        Err(e) => (String::new(), Some(e.to_string())),
                    };
                    messages.push(Message::tool_result(call.call_id.clone(), result_text.clone()));
                    let mut event = Event::ToolCall {
                        envelope: envelope(EventCategory::ToolCall, format!("called {}", call.tool_name)),
                        tool_name: call.tool_name.clone(),
                        input: call.arguments.clone(),
                        output: output.ok(),
                        error,
                    };
                    event.truncate_text();
                    events.push(event);
                }
                Dispatch::Transfer { from, target, allowed } => {
                    let status = if allowed { TransferStatus::Allowed } else { TransferStatus::Denied };
                    let summary = if allowed {
                        format!("transferred from {from} to {target}")
                    } else {
                        format!("transfer from {from} to {target} denied")
                    };
                    messages.push(Message::tool_result(
                        call.call_id.clone(),
                        if allowed { format!("transferred to {target}") } else { "transfer denied".to_string() },
                    ));
                    events.push(Event::AgentTransfer {
                        envelope: envelope(EventCategory::AgentTransfer, summary),
                        from_agent: from.clone(),
                        to_agent: target.clone(),
                        status,
                    });
                    if allowed {
                        current_agent = agent::resolve(&state.transfer, &target)?;
                    }
                }
            }
        }
    };

    let mut final_event = Event::ModelResponse {
        envelope: envelope(EventCategory::ModelResponse, "final response".to_string()),
        text: final_text.clone(),
        is_final: true,
        agent_name: Some(current_agent.name.clone()),
    };
    final_event.truncate_text();
    events.push(final_event);

    {
        let mut guard = session.lock();
        guard.active_agent = current_agent.name.clone();
        for event in &events {
            push_deduped(&mut guard, event.clone());
        }
        state
            .sessions
            .record_turn(&mut guard, TurnRole::Assistant, &final_text, Some(current_agent.name.clone()))?;
    }

    Ok(TurnOutcome::Completed { response: final_text, events })
}

fn envelope(category: EventCategory, summary: String) -> EventEnvelope {
    EventEnvelope { category, timestamp: chrono::Utc::now(), summary, details: None }
}

/// Drop an event whose `(category, summary, timestamp)` matches the most
/// recently buffered event (spec §4.5 Event classification: "duplicate
/// detection on the event buffer compares type, summary, and timestamp").
fn push_deduped(session: &mut Session, event: Event) {
    let is_dup = session
        .events
        .tail(1)
        .first()
        .map(|last| last.dedup_key() == event.dedup_key())
        .unwrap_or(false);
    if !is_dup {
        session.push_event(event);
    }
}
