//! The agent hierarchy: a directed graph of named agents built leaves-first
//! from configuration (spec §3 Agent, §4.1).

use std::collections::BTreeSet;
use std::sync::Arc;

use orc_domain::config::{AgentConfig, AgentDefinition};
use orc_domain::error::{Error, Result};
use orc_tools::registry::ToolRegistry;

/// Immutable after construction, identified by a globally unique name.
#[derive(Debug, Clone)]
pub struct Agent {
    pub name: String,
    pub model: String,
    pub instruction: String,
    pub tool_names: Vec<String>,
    pub sub_agents: Vec<String>,
    pub allowed_transfers: BTreeSet<String>,
}

/// Builds every `Agent` from `AgentConfig`, leaves-first, validating name
/// uniqueness and that every `sub_agents`/`allowed_transfers` reference
/// resolves to a known agent.
pub fn build_agents(
    config: &AgentConfig,
    tools: &ToolRegistry,
) -> Result<Vec<Arc<Agent>>> {
    let mut order = leaves_first_order(config)?;
    order.dedup();

    let mut built = Vec::with_capacity(order.len());
    for name in &order {
        let def = config
            .agents
            .get(name)
            .ok_or_else(|| Error::Config(format!("agent '{name}' has no definition")))?;
        built.push(Arc::new(build_one(name, def, config, tools)?));
    }
    Ok(built)
}

fn build_one(
    name: &str,
    def: &AgentDefinition,
    config: &AgentConfig,
    tools: &ToolRegistry,
) -> Result<Agent> {
    let mut tool_names = Vec::new();
    for toolset in &def.toolsets {
        let names = tools
            .toolset(toolset)
            .ok_or_else(|| Error::UnknownResource(format!("toolset '{toolset}'")))?;
        tool_names.extend(names.iter().cloned());
    }

    for target in &def.allowed_transfers {
        if !config.agents.contains_key(target) {
            return Err(Error::Config(format!(
                "agent '{name}' allows transfer to unknown agent '{target}'"
            )));
        }
    }
    for child in &def.sub_agents {
        if !config.agents.contains_key(child) {
            return Err(Error::Config(format!(
                "agent '{name}' has unknown sub_agent '{child}'"
            )));
        }
    }

    tracing::info!(
        agent = name,
        model = %def.model.as_deref().unwrap_or(&config.model),
        tools = tool_names.len(),
        transfers = ?def.allowed_transfers,
        "registered agent"
    );

    Ok(Agent {
        name: name.to_string(),
        model: def.model.clone().unwrap_or_else(|| config.model.clone()),
        instruction: def.instruction.clone(),
        tool_names,
        sub_agents: def.sub_agents.clone(),
        allowed_transfers: def.allowed_transfers.clone(),
    })
}

/// Topologically order agent names so that every `sub_agents` entry is
/// registered before its parent. Construction-time name collisions (an
/// agent appearing with conflicting definitions) are caught by `HashMap`
/// key uniqueness in `AgentConfig::agents`, so the remaining check here is
/// purely for dangling references, which `build_one` validates.
fn leaves_first_order(config: &AgentConfig) -> Result<Vec<String>> {
    let mut order = Vec::new();
    let mut visited = BTreeSet::new();
    let mut visiting = BTreeSet::new();

    fn visit(
        name: &str,
        config: &AgentConfig,
        order: &mut Vec<String>,
        visited: &mut BTreeSet<String>,
        visiting: &mut BTreeSet<String>,
    ) -> Result<()> {
        if visited.contains(name) {
            return Ok(());
        }
        if visiting.contains(name) {
            // A sub_agent cycle; allowed_transfers may be cyclic but
            // sub_agents describes ownership and must not be.
            return Err(Error::Config(format!(
                "cyclic sub_agents relationship involving '{name}'"
            )));
        }
        visiting.insert(name.to_string());
        if let Some(def) = config.agents.get(name) {
            for child in &def.sub_agents {
                visit(child, config, order, visited, visiting)?;
            }
        }
        visiting.remove(name);
        visited.insert(name.to_string());
        order.push(name.to_string());
        Ok(())
    }

    let mut names: Vec<&String> = config.agents.keys().collect();
    names.sort();
    for name in names {
        visit(name, config, &mut order, &mut visited, &mut visiting)?;
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use orc_domain::config::{AgentConfig, AgentDefinition};
    use orc_tools::registry::ToolRegistry;
    use std::collections::HashMap;

    fn config_with(agents: Vec<(&str, AgentDefinition)>) -> AgentConfig {
        let mut cfg = AgentConfig::default();
        cfg.agents = agents
            .into_iter()
            .map(|(n, d)| (n.to_string(), d))
            .collect::<HashMap<_, _>>();
        cfg
    }

    #[test]
    fn leaves_registered_before_parents() {
        let mut parent = AgentDefinition::default();
        parent.sub_agents = vec!["child".into()];
        let child = AgentDefinition::default();
        let cfg = config_with(vec![("parent", parent), ("child", child)]);
        let order = leaves_first_order(&cfg).unwrap();
        let child_pos = order.iter().position(|n| n == "child").unwrap();
        let parent_pos = order.iter().position(|n| n == "parent").unwrap();
        assert!(child_pos < parent_pos);
    }

    #[test]
    fn unknown_allowed_transfer_target_is_config_error() {
        let mut def = AgentDefinition::default();
        def.allowed_transfers.insert("ghost".into());
        let cfg = config_with(vec![("root", def)]);
        let tools = ToolRegistry::empty();
        let result = build_agents(&cfg, &tools);
        assert!(result.is_err());
    }
}
