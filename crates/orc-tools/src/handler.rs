//! The tool handler contract (spec §3 ToolDescriptor, §4.2).

use std::sync::Arc;

use async_trait::async_trait;
use orc_domain::error::Result;
use serde_json::Value;

#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Given input already validated against `ToolDescriptor::input_schema`,
    /// return a result payload or a structured error. Must be re-entrant
    /// and respect the passed-in timeout budget by returning promptly when
    /// cancelled; the registry enforces the hard timeout externally.
    async fn call(&self, input: Value) -> Result<Value>;
}

#[derive(Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
    pub handler: Arc<dyn ToolHandler>,
}

impl std::fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish()
    }
}

impl ToolDescriptor {
    /// Minimal structural validation against `input_schema`: checks that
    /// every name in a top-level `required` array is present. This is not
    /// a full JSON-Schema validator — it covers the "schema-invalid calls
    /// are rejected before reaching the handler" contract (spec §4.2)
    /// without pulling in a schema engine the corpus doesn't otherwise use.
    pub fn validate(&self, input: &Value) -> Result<()> {
        let Some(required) = self.input_schema.get("required").and_then(|r| r.as_array()) else {
            return Ok(());
        };
        for field in required {
            let Some(field) = field.as_str() else { continue };
            if input.get(field).is_none() {
                return Err(orc_domain::error::Error::InvalidInput(format!(
                    "tool '{}': missing required field '{field}'",
                    self.name
                )));
            }
        }
        Ok(())
    }
}
