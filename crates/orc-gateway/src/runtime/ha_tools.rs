//! Home Assistant tool handlers, registered into the `home-assistant`
//! toolset via `ToolRegistry::register_home_assistant` (spec §4.2, §4.4).
//! Kept in the gateway crate rather than `orc-tools` since it needs an
//! `orc-ha` dependency that crate otherwise has no use for.

use std::sync::Arc;

use async_trait::async_trait;
use orc_domain::error::{Error, Result};
use orc_ha::{search, HaClient, StateCache};
use orc_tools::{ToolDescriptor, ToolHandler};
use serde_json::{json, Value};

struct HaSearch {
    cache: Arc<StateCache>,
}

#[async_trait]
impl ToolHandler for HaSearch {
    async fn call(&self, input: Value) -> Result<Value> {
        let query = input.get("query").and_then(|v| v.as_str()).unwrap_or_default();
        let domain = input.get("domain").and_then(|v| v.as_str());
        let results = search(&self.cache, query, domain);
        Ok(json!(results
            .iter()
            .map(|r| json!({
                "entity_id": r.entity_id,
                "friendly_name": r.friendly_name,
                "score": r.score,
                "has_state": r.has_state,
            }))
            .collect::<Vec<_>>()))
    }
}

struct HaGetState {
    cache: Arc<StateCache>,
}

#[async_trait]
impl ToolHandler for HaGetState {
    async fn call(&self, input: Value) -> Result<Value> {
        let entity_id = input
            .get("entity_id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::InvalidInput("missing 'entity_id'".into()))?;
        self.cache
            .get_state(entity_id)
            .map(|state| json!(state))
            .ok_or_else(|| Error::UnknownResource(format!("entity '{entity_id}'")))
    }
}

struct HaCallService {
    client: Arc<HaClient>,
}

#[async_trait]
impl ToolHandler for HaCallService {
    async fn call(&self, input: Value) -> Result<Value> {
        let domain = input
            .get("domain")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::InvalidInput("missing 'domain'".into()))?;
        let service = input
            .get("service")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::InvalidInput("missing 'service'".into()))?;
        let entity_id = input
            .get("entity_id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::InvalidInput("missing 'entity_id'".into()))?;
        let service_data = input.get("service_data").cloned().unwrap_or_else(|| json!({}));
        self.client.call_service(domain, service, entity_id, service_data).await
    }
}

/// Build the `home-assistant` toolset's descriptors, wiring in the shared
/// cache (reads) and client (writes via `call_service`).
pub fn descriptors(cache: Arc<StateCache>, client: Arc<HaClient>) -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: "ha_search".to_string(),
            description: "Search Home Assistant entities by name, area, or device.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {"query": {"type": "string"}, "domain": {"type": "string"}},
                "required": ["query"],
            }),
            handler: Arc::new(HaSearch { cache: cache.clone() }),
        },
        ToolDescriptor {
            name: "ha_get_state".to_string(),
            description: "Get the current state of a Home Assistant entity.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {"entity_id": {"type": "string"}},
                "required": ["entity_id"],
            }),
            handler: Arc::new(HaGetState { cache }),
        },
        ToolDescriptor {
            name: "ha_call_service".to_string(),
            description: "Call a Home Assistant service against an entity.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "domain": {"type": "string"},
                    "service": {"type": "string"},
                    "entity_id": {"type": "string"},
                    "service_data": {"type": "object"},
                },
                "required": ["domain", "service", "entity_id"],
            }),
            handler: Arc::new(HaCallService { client }),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;

    #[tokio::test]
    async fn ha_get_state_reports_unknown_resource_for_missing_entity() {
        let cache = Arc::new(StateCache::new());
        let descriptors = descriptors(cache.clone(), HaClient::new(
            orc_ha::HaClientConfig {
                url: "ws://localhost:8123/api/websocket".into(),
                token: "tok".into(),
                request_timeout: std::time::Duration::from_secs(10),
                registry_timeout: std::time::Duration::from_secs(30),
                backoff: Default::default(),
            },
            cache.clone(),
        ));
        let get_state = descriptors.iter().find(|d| d.name == "ha_get_state").unwrap();
        let err = get_state.handler.call(json!({"entity_id": "light.missing"})).await.unwrap_err();
        assert_eq!(err.kind(), "unknown_resource");
    }

    #[tokio::test]
    async fn ha_search_returns_matches_from_cache() {
        let cache = Arc::new(StateCache::new());
        let mut attrs = HashMap::new();
        attrs.insert("friendly_name".to_string(), json!("Basement Main"));
        cache.apply_state_changed(
            "light.basement_main",
            Some(orc_ha::types::HaState {
                entity_id: "light.basement_main".into(),
                state: "off".into(),
                attributes: attrs,
                last_changed: Utc::now(),
            }),
        );
        let client = HaClient::new(
            orc_ha::HaClientConfig {
                url: "ws://localhost:8123/api/websocket".into(),
                token: "tok".into(),
                request_timeout: std::time::Duration::from_secs(10),
                registry_timeout: std::time::Duration::from_secs(30),
                backoff: Default::default(),
            },
            cache.clone(),
        );
        let descriptors = descriptors(cache, client);
        let search_tool = descriptors.iter().find(|d| d.name == "ha_search").unwrap();
        let out = search_tool.handler.call(json!({"query": "basement"})).await.unwrap();
        assert_eq!(out[0]["entity_id"], "light.basement_main");
    }
}
