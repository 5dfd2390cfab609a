//! Handlers for tool categories that are external collaborators (spec §1
//! OUT OF SCOPE): present in the registry so agent construction and
//! `/api/tools` behave normally, but never reach a real backend.

use async_trait::async_trait;
use orc_domain::error::Result;
use serde_json::{json, Value};

use crate::handler::ToolHandler;

pub struct NotAvailable {
    pub category: &'static str,
}

#[async_trait]
impl ToolHandler for NotAvailable {
    async fn call(&self, _input: Value) -> Result<Value> {
        Ok(json!({
            "error": format!("{} is an external collaborator; not implemented", self.category),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stub_returns_structured_error_not_a_rust_error() {
        let handler = NotAvailable { category: "web-search" };
        let result = handler.call(json!({})).await.unwrap();
        assert!(result["error"].as_str().unwrap().contains("web-search"));
    }
}
