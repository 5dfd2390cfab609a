//! The transfer controller: the single source of truth for "who may
//! transfer to whom" (spec §4.1).

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use orc_domain::error::{Error, Result};
use serde_json::{json, Value};

use crate::hierarchy::Agent;

/// The name of the synthetic tool every agent is given access to.
pub const TRANSFER_TOOL_NAME: &str = "transfer_to_agent";

pub struct TransferController {
    agents: HashMap<String, Arc<Agent>>,
    edges: HashMap<String, BTreeSet<String>>,
}

impl TransferController {
    /// Build the controller from a set of already-constructed agents,
    /// registering each leaves-first (the caller is expected to have
    /// produced `agents` in that order via `hierarchy::build_agents`).
    pub fn new(agents: Vec<Arc<Agent>>) -> Result<Self> {
        let mut controller = TransferController {
            agents: HashMap::new(),
            edges: HashMap::new(),
        };
        for agent in agents {
            controller.register(agent)?;
        }
        Ok(controller)
    }

    /// `Register(agent, allowed_targets)` — idempotent by name; returns
    /// `InvalidInput` if a different agent already owns the name.
    pub fn register(&mut self, agent: Arc<Agent>) -> Result<()> {
        if let Some(existing) = self.agents.get(&agent.name) {
            if existing.name == agent.name && Arc::ptr_eq(existing, &agent) {
                return Ok(());
            }
            return Err(Error::InvalidInput(format!(
                "duplicate agent name: {}",
                agent.name
            )));
        }
        self.edges
            .insert(agent.name.clone(), agent.allowed_transfers.clone());
        self.agents.insert(agent.name.clone(), agent);
        Ok(())
    }

    /// `AllowTransfer(source, target)` — adds an edge; fails with
    /// `UnknownResource` if either end is missing.
    pub fn allow_transfer(&mut self, source: &str, target: &str) -> Result<()> {
        if !self.agents.contains_key(source) {
            return Err(Error::UnknownResource(format!("agent '{source}'")));
        }
        if !self.agents.contains_key(target) {
            return Err(Error::UnknownResource(format!("agent '{target}'")));
        }
        self.edges
            .entry(source.to_string())
            .or_default()
            .insert(target.to_string());
        Ok(())
    }

    /// `Transfer(source, target)` — succeeds and yields the target agent
    /// iff `target` is in `allowed_transfers[source]`.
    pub fn transfer(&self, source: &str, target: &str) -> Result<Arc<Agent>> {
        let allowed = self
            .edges
            .get(source)
            .map(|set| set.contains(target))
            .unwrap_or(false);
        if !allowed {
            return Err(Error::TransferDenied {
                from: source.to_string(),
                to: target.to_string(),
            });
        }
        self.agents
            .get(target)
            .cloned()
            .ok_or_else(|| Error::UnknownResource(format!("agent '{target}'")))
    }

    pub fn get(&self, name: &str) -> Option<Arc<Agent>> {
        self.agents.get(name).cloned()
    }

    pub fn allowed_targets(&self, source: &str) -> BTreeSet<String> {
        self.edges.get(source).cloned().unwrap_or_default()
    }

    /// `ToolFor(agent)` — the synthetic transfer tool whose schema encodes
    /// the agent's *current* allowed targets. Regenerated on every call so
    /// mutation of the rule map is always reflected (REDESIGN FLAG
    /// "Transfer tool per agent").
    pub fn tool_schema_for(&self, agent: &str) -> Value {
        let targets: Vec<String> = self.allowed_targets(agent).into_iter().collect();
        json!({
            "name": TRANSFER_TOOL_NAME,
            "description": "Transfer control of the conversation to another agent.",
            "input_schema": {
                "type": "object",
                "properties": {
                    "agent_name": {
                        "type": "string",
                        "enum": targets,
                    }
                },
                "required": ["agent_name"],
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet as Set;

    fn agent(name: &str, allowed: &[&str]) -> Arc<Agent> {
        Arc::new(Agent {
            name: name.to_string(),
            model: "test-model".into(),
            instruction: String::new(),
            tool_names: vec![],
            sub_agents: vec![],
            allowed_transfers: allowed.iter().map(|s| s.to_string()).collect::<Set<_>>(),
        })
    }

    #[test]
    fn transfer_succeeds_within_allowed_edge() {
        let controller =
            TransferController::new(vec![agent("scout", &["beto"]), agent("beto", &[])]).unwrap();
        let target = controller.transfer("scout", "beto").unwrap();
        assert_eq!(target.name, "beto");
    }

    #[test]
    fn transfer_denied_outside_allowed_edge() {
        let controller = TransferController::new(vec![
            agent("scout", &["beto"]),
            agent("beto", &[]),
            agent("axel", &[]),
        ])
        .unwrap();
        let err = controller.transfer("scout", "axel").unwrap_err();
        assert!(matches!(err, Error::TransferDenied { .. }));
    }

    #[test]
    fn duplicate_agent_name_is_error() {
        let mut controller = TransferController::new(vec![agent("beto", &[])]).unwrap();
        let dup = agent("beto", &[]);
        assert!(controller.register(dup).is_err());
    }

    #[test]
    fn tool_schema_reflects_live_edges() {
        let mut controller =
            TransferController::new(vec![agent("scout", &[]), agent("beto", &[])]).unwrap();
        let schema = controller.tool_schema_for("scout");
        assert_eq!(
            schema["input_schema"]["properties"]["agent_name"]["enum"],
            serde_json::json!([])
        );
        controller.allow_transfer("scout", "beto").unwrap();
        let schema = controller.tool_schema_for("scout");
        assert_eq!(
            schema["input_schema"]["properties"]["agent_name"]["enum"],
            serde_json::json!(["beto"])
        );
    }
}
