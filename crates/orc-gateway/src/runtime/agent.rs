//! Active-agent resolution and tool-definition assembly for one turn (spec
//! §4.1, §4.5). Transfer moves the session's `active_agent` pointer within
//! a single session; there is no isolated child session the way the
//! teacher's `agent.run` delegation model spawned one.

use std::sync::Arc;

use orc_agents::{Agent, TransferController, TRANSFER_TOOL_NAME};
use orc_domain::error::{Error, Result};
use orc_domain::tool::ToolDefinition;
use orc_tools::ToolRegistry;

/// Resolve the agent named `name` against the transfer controller. A miss
/// means session state and configuration have drifted — the active agent
/// named in a session no longer exists in the hierarchy.
pub fn resolve(transfer: &TransferController, name: &str) -> Result<Arc<Agent>> {
    transfer
        .get(name)
        .ok_or_else(|| Error::UnknownResource(format!("agent '{name}'")))
}

/// Build the `ToolDefinition`s the model sees this turn: the agent's own
/// tools, plus a synthetic `transfer_to_agent` tool scoped to its current
/// allowed targets (omitted entirely for an agent with no allowed
/// transfers).
pub fn tool_definitions_for(
    tools: &ToolRegistry,
    transfer: &TransferController,
    agent: &Agent,
) -> Vec<ToolDefinition> {
    let mut defs: Vec<ToolDefinition> = agent
        .tool_names
        .iter()
        .filter_map(|name| tools.get(name))
        .map(|descriptor| ToolDefinition {
            name: descriptor.name.clone(),
            description: descriptor.description.clone(),
            parameters: descriptor.input_schema.clone(),
        })
        .collect();

    if !agent.allowed_transfers.is_empty() {
        let schema = transfer.tool_schema_for(&agent.name);
        defs.push(ToolDefinition {
            name: TRANSFER_TOOL_NAME.to_string(),
            description: schema["description"].as_str().unwrap_or_default().to_string(),
            parameters: schema["input_schema"].clone(),
        });
    }

    defs
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use orc_domain::config::ShellMode;

    fn test_agent(name: &str, tool_names: Vec<String>, allowed: &[&str]) -> Arc<Agent> {
        Arc::new(Agent {
            name: name.to_string(),
            model: "test/model".into(),
            instruction: String::new(),
            tool_names,
            sub_agents: vec![],
            allowed_transfers: allowed.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
        })
    }

    #[test]
    fn resolve_missing_agent_is_unknown_resource() {
        let controller = TransferController::new(vec![test_agent("beto", vec![], &[])]).unwrap();
        let err = resolve(&controller, "ghost").unwrap_err();
        assert_eq!(err.kind(), "unknown_resource");
    }

    #[test]
    fn tool_definitions_omit_transfer_when_no_allowed_targets() {
        let tools = ToolRegistry::build(std::env::temp_dir(), ShellMode::Strict, vec![], Default::default());
        let agent = test_agent("beto", vec!["get_current_time".to_string()], &[]);
        let controller = TransferController::new(vec![agent.clone()]).unwrap();
        let defs = tool_definitions_for(&tools, &controller, &agent);
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "get_current_time");
    }

    #[test]
    fn tool_definitions_include_live_transfer_schema() {
        let tools = ToolRegistry::build(std::env::temp_dir(), ShellMode::Strict, vec![], Default::default());
        let scout = test_agent("scout", vec![], &["beto"]);
        let beto = test_agent("beto", vec![], &[]);
        let controller = TransferController::new(vec![scout.clone(), beto]).unwrap();
        let defs = tool_definitions_for(&tools, &controller, &scout);
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, TRANSFER_TOOL_NAME);
        assert_eq!(defs[0].parameters["properties"]["agent_name"]["enum"], serde_json::json!(["beto"]));
    }
}
