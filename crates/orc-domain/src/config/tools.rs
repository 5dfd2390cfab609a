use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// `tools` config section: per-tool timeouts and the shell tool's security
/// mode (spec §4.2).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub default_timeout_secs: u64,
    pub tools: HashMap<String, ToolConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    pub timeout_secs: Option<u64>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self { timeout_secs: None }
    }
}

impl ToolsConfig {
    /// Effective timeout for `tool_name`: per-tool override, else the
    /// configured default, else 60s (spec §5).
    pub fn timeout_secs(&self, tool_name: &str) -> u64 {
        self.tools
            .get(tool_name)
            .and_then(|t| t.timeout_secs)
            .unwrap_or(if self.default_timeout_secs > 0 {
                self.default_timeout_secs
            } else {
                60
            })
    }
}

/// Shell tool security mode (spec §4.2). Chosen per agent at construction;
/// cannot be elevated at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShellMode {
    /// Only commands in the agent's `ToolPolicy::allow` list may run.
    Strict,
    /// Any command may run.
    Permissive,
}
