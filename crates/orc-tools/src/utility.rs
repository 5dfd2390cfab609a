//! The `utility` toolset: a small fixed set of always-available tools.

use async_trait::async_trait;
use chrono::Utc;
use orc_domain::error::Result;
use serde_json::{json, Value};

use crate::handler::ToolHandler;

pub struct GetCurrentTime;

#[async_trait]
impl ToolHandler for GetCurrentTime {
    async fn call(&self, _input: Value) -> Result<Value> {
        Ok(json!({ "time": Utc::now().to_rfc3339() }))
    }
}

pub struct Echo;

#[async_trait]
impl ToolHandler for Echo {
    async fn call(&self, input: Value) -> Result<Value> {
        Ok(json!({ "echo": input.get("text").cloned().unwrap_or(Value::Null) }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_current_time_returns_iso_timestamp() {
        let result = GetCurrentTime.call(json!({})).await.unwrap();
        let time = result["time"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(time).is_ok());
    }

    #[tokio::test]
    async fn echo_roundtrips_text() {
        let result = Echo.call(json!({"text": "hi"})).await.unwrap();
        assert_eq!(result["echo"], json!("hi"));
    }
}
