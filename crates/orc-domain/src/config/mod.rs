//! Layered configuration: a TOML file, then `ORC_`-prefixed environment
//! overrides, then typed accessors. Recognized sections match the external
//! interface exactly (file < environment overrides).

mod agent;
mod home_assistant;
mod integrations;
mod mcp_servers;
mod observability;
mod server;
mod sessions;
mod tools;
mod vector_db;

pub use agent::{AgentConfig, AgentDefinition, ToolPolicy};
pub use home_assistant::HomeAssistantConfig;
pub use integrations::{Crawl4aiConfig, IntegrationsConfig};
pub use mcp_servers::{McpServerConfig, McpTransport};
pub use observability::ObservabilityConfig;
pub use server::ServerConfig;
pub use sessions::SessionsConfig;
pub use tools::{ShellMode, ToolConfig, ToolsConfig};
pub use vector_db::VectorDbConfig;

use std::path::Path;

use crate::error::{Error, Result};

/// The process-wide configuration root.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    pub agent: AgentConfig,
    pub vector_db: VectorDbConfig,
    pub integrations: IntegrationsConfig,
    pub home_assistant: HomeAssistantConfig,
    pub mcp_servers: Vec<McpServerConfig>,
    pub server: ServerConfig,
    pub sessions: SessionsConfig,
    pub tools: ToolsConfig,
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load from a TOML file at `path`, then apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::Config(format!("reading {}: {e}", path.as_ref().display())))?;
        Self::from_str(&text)
    }

    /// Parse from an in-memory TOML document, then apply environment
    /// overrides. Used by `load` and directly by tests.
    pub fn from_str(text: &str) -> Result<Self> {
        let mut cfg: Config =
            toml::from_str(text).map_err(|e| Error::Config(format!("parsing config: {e}")))?;
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    /// Environment overrides use the `ORC_SECTION__FIELD` convention
    /// (double underscore nests), and take precedence over file values
    /// whenever the variable is present and non-empty.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("ORC_HOME_ASSISTANT__URL") {
            self.home_assistant.url = v;
        }
        if let Ok(v) = std::env::var("ORC_HOME_ASSISTANT__TOKEN") {
            self.home_assistant.token = v;
        }
        if let Ok(v) = std::env::var("ORC_HOME_ASSISTANT__ENABLED") {
            if let Ok(b) = v.parse() {
                self.home_assistant.enabled = b;
            }
        }
        if let Ok(v) = std::env::var("ORC_VECTOR_DB__URL") {
            self.vector_db.url = v;
        }
        if let Ok(v) = std::env::var("ORC_VECTOR_DB__API_KEY") {
            self.vector_db.api_key = Some(v);
        }
        if let Ok(v) = std::env::var("ORC_INTEGRATIONS__CRAWL4AI__API_URL") {
            self.integrations.crawl4ai.api_url = v;
        }
        if let Ok(v) = std::env::var("ORC_INTEGRATIONS__CRAWL4AI__API_TOKEN") {
            self.integrations.crawl4ai.api_token = Some(v);
        }
        if let Ok(v) = std::env::var("ORC_SERVER__BIND") {
            self.server.bind = v;
        }
        if let Ok(v) = std::env::var("ORC_SERVER__PORT") {
            if let Ok(p) = v.parse() {
                self.server.port = p;
            }
        }
        if let Ok(v) = std::env::var("ORC_AGENT__MODEL") {
            self.agent.model = v;
        }
        if let Ok(v) = std::env::var("ORC_AGENT__MAX_TRANSFER_DEPTH") {
            if let Ok(d) = v.parse() {
                self.agent.max_transfer_depth = d;
            }
        }
        if let Ok(v) = std::env::var("ORC_OBSERVABILITY__OTLP_ENDPOINT") {
            self.observability.otlp_endpoint = Some(v);
        }
    }
}
