//! The normalized event taxonomy delivered to clients and stored in each
//! session's event buffer (spec §3 Event, §4.5 Event classification).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Truncate any event `text` field longer than this, appending a marker.
pub const MAX_EVENT_TEXT_CHARS: usize = 100_000;
/// Split an outgoing batch into single-event frames once it would exceed
/// this many bytes; a still-oversized single frame falls back to per-event
/// truncation.
pub const MAX_FRAME_BYTES: usize = 1024 * 1024;

/// Envelope fields shared by every event variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub category: EventCategory,
    pub timestamp: DateTime<Utc>,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    ToolCall,
    AgentTransfer,
    Planner,
    ModelResponse,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    Allowed,
    Denied,
}

/// One normalized event produced during a turn (spec §3 Event).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    #[serde(rename = "tool_call")]
    ToolCall {
        #[serde(flatten)]
        envelope: EventEnvelope,
        tool_name: String,
        input: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    #[serde(rename = "agent_transfer")]
    AgentTransfer {
        #[serde(flatten)]
        envelope: EventEnvelope,
        from_agent: String,
        to_agent: String,
        status: TransferStatus,
    },
    #[serde(rename = "planner")]
    Planner {
        #[serde(flatten)]
        envelope: EventEnvelope,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        plan: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        plan_step: Option<String>,
    },
    #[serde(rename = "model_response")]
    ModelResponse {
        #[serde(flatten)]
        envelope: EventEnvelope,
        text: String,
        is_final: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        agent_name: Option<String>,
    },
    #[serde(rename = "other")]
    Other {
        #[serde(flatten)]
        envelope: EventEnvelope,
    },
}

impl Event {
    pub fn envelope(&self) -> &EventEnvelope {
        match self {
            Event::ToolCall { envelope, .. }
            | Event::AgentTransfer { envelope, .. }
            | Event::Planner { envelope, .. }
            | Event::ModelResponse { envelope, .. }
            | Event::Other { envelope } => envelope,
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, Event::ModelResponse { is_final: true, .. })
    }

    /// Truncate an oversized `text`-bearing event in place, per the
    /// 100,000-char bound. No-op for variants without a `text` field.
    pub fn truncate_text(&mut self) {
        if let Event::ModelResponse { text, .. } = self {
            if text.chars().count() > MAX_EVENT_TEXT_CHARS {
                let truncated: String = text.chars().take(MAX_EVENT_TEXT_CHARS).collect();
                let original_len = text.chars().count();
                *text = format!(
                    "{truncated}\n…[truncated, original length {original_len} chars]"
                );
            }
        }
    }

    /// Duplicate-detection key: `(category, summary, timestamp)` per the
    /// event-buffer dedup rule in spec §4.5.
    pub fn dedup_key(&self) -> (EventCategory, String, DateTime<Utc>) {
        let env = self.envelope();
        (env.category, env.summary.clone(), env.timestamp)
    }
}

/// Split a batch of events into frames no larger than `MAX_FRAME_BYTES`
/// when serialized, falling back to per-event truncation for any event that
/// alone still exceeds the limit.
pub fn bound_batch(mut events: Vec<Event>) -> Vec<Vec<Event>> {
    for e in &mut events {
        e.truncate_text();
    }
    let mut frames = Vec::new();
    let mut current = Vec::new();
    let mut current_bytes = 0usize;
    for event in events {
        let size = serde_json::to_vec(&event).map(|v| v.len()).unwrap_or(0);
        if size > MAX_FRAME_BYTES {
            // Even after truncation this single event is oversized; ship it
            // alone. truncate_text already bounds `text`; nothing further to
            // cut without dropping data the client asked for.
            if !current.is_empty() {
                frames.push(std::mem::take(&mut current));
                current_bytes = 0;
            }
            frames.push(vec![event]);
            continue;
        }
        if current_bytes + size > MAX_FRAME_BYTES && !current.is_empty() {
            frames.push(std::mem::take(&mut current));
            current_bytes = 0;
        }
        current_bytes += size;
        current.push(event);
    }
    if !current.is_empty() {
        frames.push(current);
    }
    frames
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(category: EventCategory) -> EventEnvelope {
        EventEnvelope {
            category,
            timestamp: Utc::now(),
            summary: "test".into(),
            details: None,
        }
    }

    #[test]
    fn truncate_text_adds_marker_past_limit() {
        let mut ev = Event::ModelResponse {
            envelope: envelope(EventCategory::ModelResponse),
            text: "a".repeat(MAX_EVENT_TEXT_CHARS + 10),
            is_final: true,
            agent_name: None,
        };
        ev.truncate_text();
        if let Event::ModelResponse { text, .. } = &ev {
            assert!(text.contains("truncated"));
            assert!(text.len() < MAX_EVENT_TEXT_CHARS + 100);
        } else {
            unreachable!();
        }
    }

    #[test]
    fn truncate_text_noop_under_limit() {
        let mut ev = Event::ModelResponse {
            envelope: envelope(EventCategory::ModelResponse),
            text: "short".into(),
            is_final: false,
            agent_name: None,
        };
        ev.truncate_text();
        if let Event::ModelResponse { text, .. } = &ev {
            assert_eq!(text, "short");
        } else {
            unreachable!();
        }
    }

    #[test]
    fn is_final_only_on_final_model_response() {
        let ev = Event::ModelResponse {
            envelope: envelope(EventCategory::ModelResponse),
            text: "hi".into(),
            is_final: true,
            agent_name: None,
        };
        assert!(ev.is_final());
        let ev2 = Event::Other { envelope: envelope(EventCategory::Other) };
        assert!(!ev2.is_final());
    }

    #[test]
    fn bound_batch_splits_oversized_batches() {
        let events: Vec<Event> = (0..5)
            .map(|i| Event::ModelResponse {
                envelope: envelope(EventCategory::ModelResponse),
                text: "x".repeat(300_000),
                is_final: false,
                agent_name: Some(format!("agent-{i}")),
            })
            .collect();
        let frames = bound_batch(events);
        assert!(frames.len() > 1);
        for frame in &frames {
            let bytes: usize = frame
                .iter()
                .map(|e| serde_json::to_vec(e).unwrap().len())
                .sum();
            assert!(bytes <= MAX_FRAME_BYTES || frame.len() == 1);
        }
    }
}
