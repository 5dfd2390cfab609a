use serde::{Deserialize, Serialize};

/// `mcp_servers`: an ordered list of `{id, name, enabled, transport, url,
/// auth_token}` (spec §6 Configuration).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpServerConfig {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub enabled: bool,
    pub transport: McpTransport,
    pub url: String,
    #[serde(default)]
    pub auth_token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum McpTransport {
    Sse,
    Stdio,
    Http,
}
