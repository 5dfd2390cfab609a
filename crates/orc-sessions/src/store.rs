//! The session manager: a concurrent map from session id to live `Session`
//! state, plus the `resolve_or_create` / reset / eviction operations the
//! gateway's HTTP and WS handlers drive (spec §3, §4.5).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use orc_domain::error::{Error, Result};

use crate::lifecycle::LifecycleManager;
use crate::transcript::TranscriptWriter;
use crate::types::{Role, Session};

/// Metadata returned about a session without handing out the live turn/event
/// state (used by `GET /api/sessions`, spec §6).
#[derive(Debug, Clone, serde::Serialize)]
pub struct SessionSummary {
    pub id: String,
    pub user_id: String,
    pub app_name: String,
    pub active_agent: String,
    pub created_at: chrono::DateTime<Utc>,
    pub updated_at: chrono::DateTime<Utc>,
    pub turn_count: usize,
}

/// Owns every live session. One lock per session would be ideal contention-
/// wise, but the spec's concurrency model (§5) only requires that the HA
/// cache lock nest inside the session lock, not that sessions be lock-free
/// among themselves — a single `RwLock<HashMap<..>>` guarding
/// `Arc<parking_lot::Mutex<Session>>` entries matches the teacher's
/// `SessionStore` shape while giving each session its own serialization
/// point for the turn loop.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<parking_lot::Mutex<Session>>>>,
    transcripts: TranscriptWriter,
    lifecycle: LifecycleManager,
    event_buffer_capacity: usize,
}

impl SessionStore {
    pub fn new(
        transcripts: TranscriptWriter,
        lifecycle: LifecycleManager,
        event_buffer_capacity: usize,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            transcripts,
            lifecycle,
            event_buffer_capacity,
        }
    }

    /// Create a fresh session with a new random id.
    pub fn create(&self, user_id: &str, app_name: &str, root_agent: &str) -> Arc<parking_lot::Mutex<Session>> {
        let id = Uuid::new_v4().to_string();
        let session = Session::new(
            id.clone(),
            user_id.to_string(),
            app_name.to_string(),
            root_agent.to_string(),
            self.event_buffer_capacity,
        );
        let handle = Arc::new(parking_lot::Mutex::new(session));
        self.sessions.write().insert(id, handle.clone());
        handle
    }

    /// Look up a session by id, applying idle/daily reset rules first. If the
    /// session has gone stale per `LifecycleManager`, it is reset in place
    /// (transcript and event log cleared, id and map entry kept) and
    /// returned — spec §4.5: "session id is opaque but must be stable
    /// across reconnects."
    pub fn get(&self, id: &str) -> Option<Arc<parking_lot::Mutex<Session>>> {
        let handle = self.sessions.read().get(id).cloned()?;
        let stale = {
            let session = handle.lock();
            self.lifecycle.should_reset(session.updated_at, Utc::now())
        };
        if let Some(reason) = stale {
            tracing::info!(session_id = id, reason = %reason, "session reset (idle timeout)");
            if let Err(e) = self.reset(id) {
                tracing::warn!(session_id = id, error = %e, "failed to truncate transcript on idle reset");
            }
        }
        Some(handle)
    }

    /// Clear a session's transcript and event log in place, keeping its id
    /// and the runner (active agent, artifacts aside) alive (spec §4.5).
    pub fn reset(&self, id: &str) -> Result<()> {
        let handle = self
            .sessions
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| Error::UnknownResource(format!("session '{id}'")))?;
        handle.lock().reset();
        self.transcripts.truncate(id)
    }

    /// Resolve an existing, non-stale session or create a new one under the
    /// same id space.
    pub fn resolve_or_create(&self, id: Option<&str>, user_id: &str, app_name: &str, root_agent: &str) -> Arc<parking_lot::Mutex<Session>> {
        if let Some(id) = id {
            if let Some(existing) = self.get(id) {
                return existing;
            }
        }
        self.create(user_id, app_name, root_agent)
    }

    pub fn remove(&self, id: &str) -> Result<()> {
        self.sessions
            .write()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::UnknownResource(format!("session '{id}'")))
    }

    pub fn list(&self) -> Vec<SessionSummary> {
        self.sessions
            .read()
            .values()
            .map(|h| {
                let s = h.lock();
                SessionSummary {
                    id: s.id.clone(),
                    user_id: s.user_id.clone(),
                    app_name: s.app_name.clone(),
                    active_agent: s.active_agent.clone(),
                    created_at: s.created_at,
                    updated_at: s.updated_at,
                    turn_count: s.turns.len(),
                }
            })
            .collect()
    }

    /// Append a turn to the session and persist it to the transcript.
    pub fn record_turn(&self, session: &mut Session, role: Role, content: &str, agent_name: Option<String>) -> Result<()> {
        let turn = session.push_turn(role, content.to_string(), agent_name).clone();
        self.transcripts.append(&session.id, &[turn])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orc_domain::config::SessionsConfig;

    fn store(tmp: &std::path::Path) -> SessionStore {
        SessionStore::new(
            TranscriptWriter::new(tmp),
            LifecycleManager::new(SessionsConfig::default()),
            1000,
        )
    }

    #[test]
    fn create_then_get_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(tmp.path());
        let handle = store.create("u1", "app", "root");
        let id = handle.lock().id.clone();
        assert!(store.get(&id).is_some());
    }

    #[test]
    fn remove_unknown_session_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(tmp.path());
        assert!(store.remove("nope").is_err());
    }

    #[test]
    fn resolve_or_create_reuses_existing() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(tmp.path());
        let handle = store.create("u1", "app", "root");
        let id = handle.lock().id.clone();
        let resolved = store.resolve_or_create(Some(&id), "u1", "app", "root");
        assert_eq!(resolved.lock().id, id);
    }

    #[test]
    fn resolve_or_create_without_id_creates_new() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(tmp.path());
        let resolved = store.resolve_or_create(None, "u1", "app", "root");
        assert!(!resolved.lock().id.is_empty());
    }

    #[test]
    fn reset_clears_session_in_place_keeping_id() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(tmp.path());
        let handle = store.create("u1", "app", "root");
        let id = handle.lock().id.clone();
        handle.lock().push_turn(Role::User, "hi".into(), None);

        store.reset(&id).unwrap();

        let session = store.get(&id).unwrap();
        assert_eq!(session.lock().id, id);
        assert!(session.lock().turns.is_empty());
    }

    #[test]
    fn reset_unknown_session_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store(tmp.path());
        assert!(store.reset("nope").is_err());
    }

    #[test]
    fn get_resets_stale_session_in_place_instead_of_evicting() {
        let tmp = tempfile::tempdir().unwrap();
        let store = SessionStore::new(
            TranscriptWriter::new(tmp.path()),
            LifecycleManager::new(SessionsConfig { idle_timeout_secs: 0, ..SessionsConfig::default() }),
            1000,
        );
        let handle = store.create("u1", "app", "root");
        let id = handle.lock().id.clone();
        handle.lock().push_turn(Role::User, "hi".into(), None);

        std::thread::sleep(std::time::Duration::from_millis(10));
        let resolved = store.get(&id).expect("stale session is reset, not evicted");
        assert_eq!(resolved.lock().id, id);
        assert!(resolved.lock().turns.is_empty());
    }
}
