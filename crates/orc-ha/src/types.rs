//! Entity/device/state types held by the state cache (spec §3 HA Entity /
//! HA Registry Entry).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HaState {
    pub entity_id: String,
    pub state: String,
    #[serde(default)]
    pub attributes: HashMap<String, Value>,
    pub last_changed: DateTime<Utc>,
}

impl HaState {
    /// The domain portion of `entity_id` (text before the first `.`).
    pub fn domain(&self) -> &str {
        self.entity_id.split('.').next().unwrap_or("")
    }

    pub fn friendly_name(&self) -> Option<&str> {
        self.attributes
            .get("friendly_name")
            .and_then(|v| v.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityRegistryEntry {
    pub entity_id: String,
    pub name: Option<String>,
    pub area: Option<String>,
    pub device_id: Option<String>,
    pub entity_category: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub platform: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceRegistryEntry {
    pub id: String,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub name: Option<String>,
    pub area: Option<String>,
    pub via_device: Option<String>,
}
