//! Tool-call dispatch for the turn loop (spec §4.2, §4.5, §7 propagation
//! policy). `transfer_to_agent` is special-cased: it mutates the session's
//! active agent rather than returning a payload, so it is routed through
//! the `TransferController` directly instead of the tool registry.

use std::time::Duration;

use orc_agents::{TransferController, TRANSFER_TOOL_NAME};
use orc_domain::config::ToolsConfig;
use orc_domain::error::{Error, Result};
use orc_domain::tool::ToolCall;
use orc_tools::ToolRegistry;
use serde_json::Value;

/// The outcome of dispatching a single tool call.
pub enum Dispatch {
    /// An ordinary tool ran; `output` carries its result or a structured
    /// error (the caller converts this into a `ToolCall` event per spec §7 —
    /// tool-level errors are surfaced, not fatal to the turn).
    Tool { output: Result<Value> },
    /// The call was `transfer_to_agent`. `allowed` reflects whether the
    /// edge existed; a denied transfer is reported as an event and the turn
    /// continues with the agent unchanged.
    Transfer { from: String, target: String, allowed: bool },
}

/// Dispatch one call. `current_agent` is the name of the agent active at
/// the start of this loop iteration — transfers are evaluated against it,
/// not against whatever a prior call in the same batch may have set.
pub async fn dispatch(
    tools: &ToolRegistry,
    tools_config: &ToolsConfig,
    transfer: &TransferController,
    current_agent: &str,
    call: &ToolCall,
) -> Dispatch {
    if call.tool_name == TRANSFER_TOOL_NAME {
        let target = call
            .arguments
            .get("agent_name")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let allowed = transfer.transfer(current_agent, &target).is_ok();
        return Dispatch::Transfer { from: current_agent.to_string(), target, allowed };
    }

    let Some(descriptor) = tools.get(&call.tool_name) else {
        return Dispatch::Tool {
            output: Err(Error::UnknownResource(format!("tool '{}'", call.tool_name))),
        };
    };

    if let Err(e) = descriptor.validate(&call.arguments) {
        return Dispatch::Tool { output: Err(e) };
    }

    let timeout = Duration::from_secs(tools_config.timeout_secs(&call.tool_name));
    let output = match tokio::time::timeout(timeout, descriptor.handler.call(call.arguments.clone())).await {
        Ok(result) => result,
        Err(_) => Err(Error::ToolTimeout { tool: call.tool_name.clone(), elapsed_ms: timeout.as_millis() as u64 }),
    };
    Dispatch::Tool { output }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orc_agents::{hierarchy::Agent, TransferController};
    use orc_domain::config::ShellMode;
    use std::collections::BTreeSet;
    use std::sync::Arc;

    fn test_agent(name: &str, allowed: &[&str]) -> Arc<Agent> {
        Arc::new(Agent {
            name: name.to_string(),
            model: "test/model".into(),
            instruction: String::new(),
            tool_names: vec![],
            sub_agents: vec![],
            allowed_transfers: allowed.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
        })
    }

    #[tokio::test]
    async fn unknown_tool_is_unknown_resource() {
        let tools = ToolRegistry::empty();
        let transfer = TransferController::new(vec![test_agent("beto", &[])]).unwrap();
        let call = ToolCall { call_id: "1".into(), tool_name: "ghost_tool".into(), arguments: serde_json::json!({}) };
        let outcome = dispatch(&tools, &ToolsConfig::default(), &transfer, "beto", &call).await;
        match outcome {
            Dispatch::Tool { output: Err(e) } => assert_eq!(e.kind(), "unknown_resource"),
            _ => panic!("expected an unknown-resource tool error"),
        }
    }

    #[tokio::test]
    async fn transfer_call_routes_through_controller() {
        let tools = ToolRegistry::empty();
        let transfer = TransferController::new(vec![test_agent("scout", &["beto"]), test_agent("beto", &[])]).unwrap();
        let call = ToolCall {
            call_id: "1".into(),
            tool_name: TRANSFER_TOOL_NAME.into(),
            arguments: serde_json::json!({"agent_name": "beto"}),
        };
        let outcome = dispatch(&tools, &ToolsConfig::default(), &transfer, "scout", &call).await;
        match outcome {
            Dispatch::Transfer { from, target, allowed } => {
                assert_eq!(from, "scout");
                assert_eq!(target, "beto");
                assert!(allowed);
            }
            _ => panic!("expected a transfer outcome"),
        }
    }

    #[tokio::test]
    async fn transfer_outside_allowed_edge_is_denied_not_erroring() {
        let tools = ToolRegistry::empty();
        let transfer = TransferController::new(vec![test_agent("scout", &[]), test_agent("beto", &[])]).unwrap();
        let call = ToolCall {
            call_id: "1".into(),
            tool_name: TRANSFER_TOOL_NAME.into(),
            arguments: serde_json::json!({"agent_name": "beto"}),
        };
        let outcome = dispatch(&tools, &ToolsConfig::default(), &transfer, "scout", &call).await;
        match outcome {
            Dispatch::Transfer { allowed, .. } => assert!(!allowed),
            _ => panic!("expected a transfer outcome"),
        }
    }

    #[tokio::test]
    async fn missing_required_field_fails_validation_before_handler() {
        let tools = ToolRegistry::build(std::env::temp_dir(), ShellMode::Strict, vec![], ToolsConfig::default());
        let transfer = TransferController::new(vec![test_agent("beto", &[])]).unwrap();
        let call = ToolCall { call_id: "1".into(), tool_name: "file_read".into(), arguments: serde_json::json!({}) };
        let outcome = dispatch(&tools, &ToolsConfig::default(), &transfer, "beto", &call).await;
        match outcome {
            Dispatch::Tool { output: Err(e) } => assert_eq!(e.kind(), "invalid_input"),
            _ => panic!("expected an invalid-input tool error"),
        }
    }
}
