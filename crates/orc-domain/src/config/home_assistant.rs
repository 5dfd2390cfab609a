use serde::{Deserialize, Serialize};

/// `home_assistant` config section (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HomeAssistantConfig {
    pub url: String,
    pub token: String,
    pub mcp_sse_url: Option<String>,
    pub enabled: bool,
    /// Default per-request timeout in seconds (spec §5: 10s default).
    pub request_timeout_secs: u64,
    /// Timeout for the two registry list operations (spec §5: 30s).
    pub registry_timeout_secs: u64,
}

impl Default for HomeAssistantConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            token: String::new(),
            mcp_sse_url: None,
            enabled: false,
            request_timeout_secs: 10,
            registry_timeout_secs: 30,
        }
    }
}
