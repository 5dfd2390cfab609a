//! The tool registry: a mapping from tool name to callable descriptor, and
//! the named toolsets agents select from (spec §4.2).

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use orc_domain::config::{ShellMode, ToolsConfig};
use orc_domain::error::{Error, Result};
use serde_json::{json, Value};

use crate::handler::{ToolDescriptor, ToolHandler};
use crate::{file_ops, shell, stub, utility};

/// Categories named in spec §4.2. Membership is fixed at build time.
pub const CATEGORIES: &[&str] = &[
    "filesystem", "web-search", "calendar", "home-assistant", "shell",
    "todo", "memory", "crawl", "utility", "scout", "axel",
];

pub struct ToolRegistry {
    tools: HashMap<String, Arc<ToolDescriptor>>,
    toolsets: HashMap<String, Vec<String>>,
    timeouts: ToolsConfig,
}

struct ShellHandler {
    mode: ShellMode,
    allow: Vec<String>,
    timeout: Duration,
}

#[async_trait]
impl ToolHandler for ShellHandler {
    async fn call(&self, input: Value) -> Result<Value> {
        let req: shell::ShellRequest = serde_json::from_value(input)
            .map_err(|e| Error::InvalidInput(e.to_string()))?;
        shell::run(self.mode, &self.allow, req, self.timeout).await
    }
}

struct FileReadHandler {
    root: PathBuf,
}

#[async_trait]
impl ToolHandler for FileReadHandler {
    async fn call(&self, input: Value) -> Result<Value> {
        let req: file_ops::FileReadRequest = serde_json::from_value(input)
            .map_err(|e| Error::InvalidInput(e.to_string()))?;
        file_ops::file_read(&self.root, req).await.map_err(Error::InvalidInput)
    }
}

struct FileListHandler {
    root: PathBuf,
}

#[async_trait]
impl ToolHandler for FileListHandler {
    async fn call(&self, input: Value) -> Result<Value> {
        let req: file_ops::FileListRequest = serde_json::from_value(input)
            .map_err(|e| Error::InvalidInput(e.to_string()))?;
        file_ops::file_list(&self.root, req).await.map_err(Error::InvalidInput)
    }
}

impl ToolRegistry {
    pub fn empty() -> Self {
        Self {
            tools: HashMap::new(),
            toolsets: HashMap::new(),
            timeouts: ToolsConfig::default(),
        }
    }

    /// Build the registry: real handlers for `filesystem`, `shell`,
    /// `home-assistant` (delegated), and `utility`; stub handlers for the
    /// remaining out-of-scope categories.
    pub fn build(
        workspace_root: PathBuf,
        shell_mode: ShellMode,
        shell_allow: Vec<String>,
        timeouts: ToolsConfig,
    ) -> Self {
        let mut registry = Self {
            tools: HashMap::new(),
            toolsets: HashMap::new(),
            timeouts,
        };

        registry.insert_tool(
            "file_read",
            "Read a file's contents within the workspace.",
            json!({"type": "object", "properties": {"path": {"type": "string"}}, "required": ["path"]}),
            Arc::new(FileReadHandler { root: workspace_root.clone() }),
        );
        registry.insert_tool(
            "file_list",
            "List a directory's entries within the workspace.",
            json!({"type": "object", "properties": {"path": {"type": "string"}}}),
            Arc::new(FileListHandler { root: workspace_root }),
        );
        registry.toolsets.insert(
            "filesystem".to_string(),
            vec!["file_read".to_string(), "file_list".to_string()],
        );

        let shell_timeout = Duration::from_secs(registry.timeouts.timeout_secs("shell"));
        registry.insert_tool(
            "shell",
            "Run a shell command.",
            json!({"type": "object", "properties": {"command": {"type": "string"}}, "required": ["command"]}),
            Arc::new(ShellHandler { mode: shell_mode, allow: shell_allow, timeout: shell_timeout }),
        );
        registry.toolsets.insert("shell".to_string(), vec!["shell".to_string()]);

        registry.insert_tool(
            "get_current_time",
            "Return the current UTC time.",
            json!({"type": "object", "properties": {}}),
            Arc::new(utility::GetCurrentTime),
        );
        registry.insert_tool(
            "echo",
            "Echo the given text back.",
            json!({"type": "object", "properties": {"text": {"type": "string"}}}),
            Arc::new(utility::Echo),
        );
        registry.toolsets.insert(
            "utility".to_string(),
            vec!["get_current_time".to_string(), "echo".to_string()],
        );

        for (category, tool_name) in [
            ("web-search", "web_search"),
            ("calendar", "calendar_lookup"),
            ("todo", "todo_manage"),
            ("memory", "memory_search"),
            ("crawl", "web_crawl"),
            ("scout", "scout_dispatch"),
            ("axel", "axel_dispatch"),
        ] {
            registry.insert_tool(
                tool_name,
                &format!("{category} tool (external collaborator)."),
                json!({"type": "object"}),
                Arc::new(stub::NotAvailable { category: leak(category) }),
            );
            registry.toolsets.insert(category.to_string(), vec![tool_name.to_string()]);
        }

        registry
    }

    /// Register a `home-assistant` toolset backed by the real resolver/client
    /// handlers built in `orc-gateway` (kept out of this crate since it
    /// depends on `orc-ha`).
    pub fn register_home_assistant(&mut self, tools: Vec<ToolDescriptor>) {
        let mut names = Vec::with_capacity(tools.len());
        for tool in tools {
            names.push(tool.name.clone());
            self.tools.insert(tool.name.clone(), Arc::new(tool));
        }
        self.toolsets.insert("home-assistant".to_string(), names);
    }

    fn insert_tool(
        &mut self,
        name: &str,
        description: &str,
        input_schema: Value,
        handler: Arc<dyn ToolHandler>,
    ) {
        self.tools.insert(
            name.to_string(),
            Arc::new(ToolDescriptor {
                name: name.to_string(),
                description: description.to_string(),
                input_schema,
                handler,
            }),
        );
    }

    pub fn get(&self, name: &str) -> Option<Arc<ToolDescriptor>> {
        self.tools.get(name).cloned()
    }

    pub fn toolset(&self, name: &str) -> Option<&Vec<String>> {
        self.toolsets.get(name)
    }

    pub fn all(&self) -> Vec<Arc<ToolDescriptor>> {
        self.tools.values().cloned().collect()
    }
}

fn leak(s: &str) -> &'static str {
    Box::leak(s.to_string().into_boxed_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_registers_every_category() {
        let registry = ToolRegistry::build(
            std::env::temp_dir(),
            ShellMode::Strict,
            vec!["ls".to_string()],
            ToolsConfig::default(),
        );
        for category in CATEGORIES {
            if *category == "home-assistant" {
                continue;
            }
            assert!(
                registry.toolset(category).is_some(),
                "missing toolset: {category}"
            );
        }
    }

    #[test]
    fn unknown_toolset_is_none() {
        let registry = ToolRegistry::empty();
        assert!(registry.toolset("does-not-exist").is_none());
    }
}
