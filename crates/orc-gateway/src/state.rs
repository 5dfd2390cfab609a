use std::collections::HashMap;
use std::sync::Arc;

use orc_agents::{Agent, TransferController};
use orc_domain::config::Config;
use orc_ha::{HaClient, StateCache};
use orc_providers::ProviderRegistry;
use orc_sessions::SessionStore;
use orc_tools::ToolRegistry;
use parking_lot::Mutex;

use crate::runtime::cancel::CancelMap;
use crate::runtime::session_lock::SessionLockMap;

/// Shared application state passed to every API handler and into the turn
/// loop spawned off each request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub llm: Arc<ProviderRegistry>,
    pub tools: Arc<ToolRegistry>,
    pub transfer: Arc<TransferController>,
    pub sessions: Arc<SessionStore>,
    pub session_locks: Arc<SessionLockMap>,
    pub cancel_map: Arc<CancelMap>,
    /// `None` when `home_assistant.enabled` is false.
    pub ha_cache: Option<Arc<StateCache>>,
    pub ha_client: Option<Arc<HaClient>>,
    /// Display names set via `PUT /api/sessions/{id}/rename`. Not part of
    /// the session model proper (spec §3 Session has no name field); this
    /// is presentation state the gateway layers on top.
    pub session_names: Arc<Mutex<HashMap<String, String>>>,
}

impl AppState {
    /// The configured root agent, or `None` if it is missing from the
    /// transfer controller — a config-time invariant that should already
    /// have been caught at startup.
    pub fn root_agent(&self) -> Option<Arc<Agent>> {
        self.transfer.get(&self.config.agent.root)
    }
}
