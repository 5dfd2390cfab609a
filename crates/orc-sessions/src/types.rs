//! The Session/Turn/Event/Artifact data model (spec §3, §4.5).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use orc_domain::event::{bound_batch, Event};

/// One turn in a session's conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub id: u64,
    pub role: Role,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// A binary artifact produced during a turn (file upload, generated image).
#[derive(Debug, Clone)]
pub struct Artifact {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

pub type ArtifactMap = HashMap<String, Artifact>;

/// Bounded in-memory event log for a session. Events beyond `capacity` are
/// dropped from the front — the buffer is a recency window for
/// `history_request` replay, not the system of record (the transcript is).
pub struct EventBuffer {
    events: Vec<Event>,
    capacity: usize,
}

impl EventBuffer {
    pub fn new(capacity: usize) -> Self {
        Self { events: Vec::new(), capacity }
    }

    pub fn push(&mut self, event: Event) {
        self.events.push(event);
        if self.events.len() > self.capacity {
            let overflow = self.events.len() - self.capacity;
            self.events.drain(0..overflow);
        }
    }

    pub fn tail(&self, limit: usize) -> &[Event] {
        let start = self.events.len().saturating_sub(limit);
        &self.events[start..]
    }

    /// Split the tail into frames no larger than `MAX_FRAME_BYTES` each,
    /// for WS replay (spec §8).
    pub fn tail_framed(&self, limit: usize) -> Vec<Vec<Event>> {
        bound_batch(self.tail(limit).to_vec())
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

/// A live session: identity, transcript, event log, and artifacts.
///
/// `active_agent` names the agent currently holding the conversation after
/// zero or more `AgentTransfer` events; it starts at the hierarchy's root.
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub app_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub active_agent: String,
    /// The agent `active_agent` returns to on reset (spec §4.5: "reset
    /// clears the transcript without destroying the runner").
    root_agent: String,
    pub turns: Vec<Turn>,
    pub events: EventBuffer,
    pub artifacts: ArtifactMap,
    next_turn_id: u64,
}

impl Session {
    pub fn new(id: String, user_id: String, app_name: String, root_agent: String, event_capacity: usize) -> Self {
        let now = Utc::now();
        Self {
            id,
            user_id,
            app_name,
            created_at: now,
            updated_at: now,
            active_agent: root_agent.clone(),
            root_agent,
            turns: Vec::new(),
            events: EventBuffer::new(event_capacity),
            artifacts: ArtifactMap::new(),
            next_turn_id: 0,
        }
    }

    /// Clear the transcript and event log in place, returning the active
    /// agent to the root, while keeping the session's id and map entry
    /// untouched (spec §4.5: the runner survives a reset, only its history
    /// doesn't).
    pub fn reset(&mut self) {
        self.turns.clear();
        self.events.clear();
        self.artifacts.clear();
        self.next_turn_id = 0;
        self.active_agent = self.root_agent.clone();
        self.updated_at = Utc::now();
    }

    pub fn push_turn(&mut self, role: Role, content: String, agent_name: Option<String>) -> &Turn {
        let turn = Turn {
            id: self.next_turn_id,
            role,
            content,
            agent_name,
            timestamp: Utc::now(),
        };
        self.next_turn_id += 1;
        self.updated_at = turn.timestamp;
        self.turns.push(turn);
        self.turns.last().expect("just pushed")
    }

    pub fn push_event(&mut self, event: Event) {
        self.updated_at = Utc::now();
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn other_event(summary: &str) -> Event {
        Event::Other {
            envelope: orc_domain::event::EventEnvelope {
                category: orc_domain::event::EventCategory::Other,
                timestamp: Utc::now(),
                summary: summary.into(),
                details: None,
            },
        }
    }

    #[test]
    fn event_buffer_drops_oldest_beyond_capacity() {
        let mut buf = EventBuffer::new(2);
        buf.push(other_event("a"));
        buf.push(other_event("b"));
        buf.push(other_event("c"));
        assert_eq!(buf.len(), 2);
    }

    #[test]
    fn session_assigns_increasing_turn_ids() {
        let mut session = Session::new("s1".into(), "u1".into(), "app".into(), "root".into(), 100);
        session.push_turn(Role::User, "hi".into(), None);
        session.push_turn(Role::Assistant, "hello".into(), Some("root".into()));
        assert_eq!(session.turns[0].id, 0);
        assert_eq!(session.turns[1].id, 1);
    }

    #[test]
    fn reset_clears_history_but_keeps_id_and_root_agent() {
        let mut session = Session::new("s1".into(), "u1".into(), "app".into(), "root".into(), 100);
        session.push_turn(Role::User, "hi".into(), None);
        session.push_event(other_event("a"));
        session.active_agent = "scout".into();

        session.reset();

        assert_eq!(session.id, "s1");
        assert!(session.turns.is_empty());
        assert!(session.events.is_empty());
        assert_eq!(session.active_agent, "root");
        assert_eq!(session.push_turn(Role::User, "next".into(), None).id, 0);
    }
}
