use serde::{Deserialize, Serialize};

/// `sessions` config section: idle lifecycle rules consumed by
/// `orc-sessions::lifecycle` and the WS heartbeat reaper (spec §5).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionsConfig {
    /// Sessions idle longer than this are eligible for a daily reset.
    pub idle_timeout_secs: u64,
    /// Expected client heartbeat interval.
    pub heartbeat_interval_secs: u64,
    /// Silent connections are reaped after this many seconds without a
    /// heartbeat (spec §5: 90s).
    pub heartbeat_reap_secs: u64,
    /// Default page size for `history_request` (spec §4.5: 50).
    pub default_history_limit: usize,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 3600,
            heartbeat_interval_secs: 30,
            heartbeat_reap_secs: 90,
            default_history_limit: 50,
        }
    }
}
