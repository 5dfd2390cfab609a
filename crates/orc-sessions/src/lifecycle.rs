//! Session idle-timeout lifecycle (spec §4.5 "Session lifecycle", §5).
//!
//! A session idle longer than the configured timeout is reset in place on
//! next lookup (transcript and event log cleared, id kept) rather than
//! evicted. There is no cross-channel or per-message-type override here —
//! the spec's single HTTP/WS interface has one idle rule, not the teacher's
//! per-channel table.

use chrono::{DateTime, Utc};

use orc_domain::config::SessionsConfig;

#[derive(Debug, Clone, Copy)]
pub enum ResetReason {
    IdleTimeout { idle_secs: u64 },
}

impl std::fmt::Display for ResetReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IdleTimeout { idle_secs } => write!(f, "idle timeout ({idle_secs}s)"),
        }
    }
}

pub struct LifecycleManager {
    config: SessionsConfig,
}

impl LifecycleManager {
    pub fn new(config: SessionsConfig) -> Self {
        Self { config }
    }

    /// `None` if the session at `last_active` is still live at `now`;
    /// `Some(reason)` if it has exceeded the idle timeout and should be
    /// dropped.
    pub fn should_reset(&self, last_active: DateTime<Utc>, now: DateTime<Utc>) -> Option<ResetReason> {
        let elapsed = now.signed_duration_since(last_active).num_seconds().max(0) as u64;
        if elapsed >= self.config.idle_timeout_secs {
            Some(ResetReason::IdleTimeout { idle_secs: self.config.idle_timeout_secs })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_session_is_reset() {
        let mgr = LifecycleManager::new(SessionsConfig { idle_timeout_secs: 60, ..Default::default() });
        let last = Utc::now() - chrono::Duration::seconds(120);
        assert!(matches!(mgr.should_reset(last, Utc::now()), Some(ResetReason::IdleTimeout { .. })));
    }

    #[test]
    fn fresh_session_is_not_reset() {
        let mgr = LifecycleManager::new(SessionsConfig { idle_timeout_secs: 3600, ..Default::default() });
        let last = Utc::now() - chrono::Duration::seconds(5);
        assert!(mgr.should_reset(last, Utc::now()).is_none());
    }
}
