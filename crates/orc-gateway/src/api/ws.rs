//! `GET /ws/{session_id}` (spec §4.5, §6): the streaming session channel.
//! One task owns the socket's read half and drives turns; a second task
//! owns the write half so concurrent senders (the turn loop's events, the
//! heartbeat reaper) go through a single per-connection writer queue
//! instead of racing on the socket directly (spec §5 "Broadcasts to a
//! client are serialized per connection").

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use orc_domain::event::bound_batch;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;

use crate::runtime::run_turn;
use crate::runtime::turn::TurnOutcome;
use crate::state::AppState;

pub async fn ws_handler(State(state): State<AppState>, Path(session_id): Path<String>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, session_id))
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InboundFrame {
    Typed(TypedFrame),
    Message { message: String },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum TypedFrame {
    Heartbeat,
    SyncRequest {
        #[serde(rename = "lastMessageId")]
        last_message_id: u64,
        #[serde(default)]
        #[allow(dead_code)]
        timestamp: Option<i64>,
    },
    HistoryRequest {
        #[serde(default)]
        limit: Option<usize>,
    },
}

async fn handle_socket(socket: WebSocket, state: AppState, session_id: String) {
    let root_agent = match state.root_agent() {
        Some(a) => a,
        None => {
            let _ = socket.close().await;
            return;
        }
    };
    let session = state.sessions.resolve_or_create(Some(&session_id), "ws", "orchestrator", &root_agent.name);
    let session_id = session.lock().id.clone();

    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let writer = tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if sink.send(WsMessage::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let reap_after = Duration::from_secs(state.config.sessions.heartbeat_reap_secs);
    let mut last_seen = tokio::time::Instant::now();

    loop {
        let remaining = reap_after.saturating_sub(last_seen.elapsed());
        let frame = tokio::select! {
            frame = stream.next() => frame,
            _ = tokio::time::sleep(remaining) => {
                tracing::info!(session_id = %session_id, "WS connection reaped for silence");
                break;
            }
        };

        let Some(Ok(msg)) = frame else { break };
        let text = match msg {
            WsMessage::Text(t) => t,
            WsMessage::Close(_) => break,
            WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Binary(_) => {
                last_seen = tokio::time::Instant::now();
                continue;
            }
        };
        last_seen = tokio::time::Instant::now();

        let Ok(inbound) = serde_json::from_str::<InboundFrame>(&text) else {
            let _ = tx.send(json!({"type": "status", "content": "invalid frame"}).to_string());
            continue;
        };

        match inbound {
            InboundFrame::Message { message } => {
                handle_turn(&state, &session, &session_id, &message, &tx).await;
            }
            InboundFrame::Typed(TypedFrame::Heartbeat) => {}
            InboundFrame::Typed(TypedFrame::SyncRequest { last_message_id, .. }) => {
                let guard = session.lock();
                let messages: Vec<_> = guard.turns.iter().filter(|t| t.id > last_message_id).cloned().collect();
                let _ = tx.send(json!({"type": "sync_response", "messages": messages}).to_string());
            }
            InboundFrame::Typed(TypedFrame::HistoryRequest { limit }) => {
                let limit = limit.unwrap_or(state.config.sessions.default_history_limit);
                let guard = session.lock();
                let start = guard.turns.len().saturating_sub(limit);
                let messages = guard.turns[start..].to_vec();
                let _ = tx.send(json!({"type": "history", "messages": messages}).to_string());
            }
        }
    }

    state.cancel_map.cancel(&session_id);
    drop(tx);
    let _ = writer.await;
}

async fn handle_turn(state: &AppState, session: &Arc<parking_lot::Mutex<orc_sessions::Session>>, session_id: &str, message: &str, tx: &mpsc::UnboundedSender<String>) {
    let permit = match state.session_locks.try_acquire(session_id) {
        Ok(p) => p,
        Err(_) => {
            let _ = tx.send(json!({"type": "status", "content": "busy"}).to_string());
            return;
        }
    };

    let cancel = state.cancel_map.register(session_id);
    let outcome = run_turn(state, session, message, &cancel).await;
    state.cancel_map.remove(session_id);
    drop(permit);

    match outcome {
        Ok(TurnOutcome::Completed { response, events }) => {
            // Payload bounding (spec §4.5): split any batch over 1 MiB into
            // single-event frames, one `events` message per sub-batch.
            for frame in bound_batch(events) {
                let _ = tx.send(json!({"type": "events", "content": frame}).to_string());
            }
            let _ = tx.send(json!({"type": "message", "content": response}).to_string());
        }
        Ok(TurnOutcome::Cancelled) => {
            let _ = tx.send(json!({"type": "status", "content": "cancelled"}).to_string());
        }
        Err(e) => {
            let _ = tx.send(json!({"type": "status", "content": e.to_string()}).to_string());
        }
    }
}
