use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

/// `agent` config section: model selection, per-agent overrides, Vertex
/// flags (spec §6 Configuration).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Root agent name; must match a key in `agents`.
    pub root: String,
    /// Default model identifier used when an agent definition omits one.
    pub model: String,
    /// Use Vertex AI endpoints instead of direct provider APIs.
    pub use_vertex_ai: bool,
    pub vertex_project: Option<String>,
    pub vertex_location: Option<String>,
    /// Per-turn transfer-depth ceiling (spec §5).
    pub max_transfer_depth: u32,
    /// Named agent definitions, keyed by agent name.
    pub agents: HashMap<String, AgentDefinition>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            root: "beto".to_string(),
            model: "gemini-2.0-flash".to_string(),
            use_vertex_ai: false,
            vertex_project: None,
            vertex_location: None,
            max_transfer_depth: 8,
            agents: HashMap::new(),
        }
    }
}

/// One agent's static configuration, used by `orc-agents` to construct the
/// hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentDefinition {
    pub model: Option<String>,
    pub instruction: String,
    /// Toolset names resolved against the `orc-tools` registry.
    pub toolsets: Vec<String>,
    /// Child agent names, registered leaves-first.
    pub sub_agents: Vec<String>,
    /// Agent names this agent may transfer control to.
    pub allowed_transfers: BTreeSet<String>,
    pub tool_policy: ToolPolicy,
}

impl Default for AgentDefinition {
    fn default() -> Self {
        Self {
            model: None,
            instruction: String::new(),
            toolsets: Vec::new(),
            sub_agents: Vec::new(),
            allowed_transfers: BTreeSet::new(),
            tool_policy: ToolPolicy::default(),
        }
    }
}

/// Per-agent shell-tool security mode and explicit allow/deny overrides
/// (spec §4.2 "Shell tool security").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPolicy {
    pub shell_mode: super::ShellMode,
    pub allow: Vec<String>,
    pub deny: Vec<String>,
}

impl Default for ToolPolicy {
    fn default() -> Self {
        Self {
            shell_mode: super::ShellMode::Strict,
            allow: Vec::new(),
            deny: Vec::new(),
        }
    }
}
