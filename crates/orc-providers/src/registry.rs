//! Provider registry: a name -> adapter map the gateway resolves an agent's
//! `model` string against. Building and authenticating the adapters
//! themselves is out of scope (spec §1); tests register a mock.

use std::collections::HashMap;
use std::sync::Arc;

use orc_domain::error::{Error, Result};

use crate::traits::LlmProvider;

pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn LlmProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self { providers: HashMap::new() }
    }

    pub fn register(&mut self, provider: Arc<dyn LlmProvider>) {
        self.providers.insert(provider.provider_id().to_string(), provider);
    }

    pub fn get(&self, provider_id: &str) -> Option<Arc<dyn LlmProvider>> {
        self.providers.get(provider_id).cloned()
    }

    /// Resolve an agent's `"provider_id/model_name"` model string to its
    /// provider and bare model name. A string with no `/` is treated
    /// entirely as the provider id, with an empty model name (the provider
    /// picks its own default).
    pub fn resolve(&self, model: &str) -> Result<(Arc<dyn LlmProvider>, &str)> {
        let (provider_id, model_name) = match model.split_once('/') {
            Some((p, m)) => (p, m),
            None => (model, ""),
        };
        let provider = self
            .get(provider_id)
            .ok_or_else(|| Error::UnknownResource(format!("llm provider '{provider_id}'")))?;
        Ok((provider, model_name))
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn list_providers(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.providers.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{ChatRequest, ChatResponse, EmbeddingsRequest, EmbeddingsResponse};
    use orc_domain::stream::{BoxStream, StreamEvent};

    struct Mock;

    #[async_trait::async_trait]
    impl LlmProvider for Mock {
        async fn chat(&self, _req: ChatRequest) -> Result<ChatResponse> {
            Ok(ChatResponse { content: "ok".into(), tool_calls: vec![], usage: None, model: "mock".into(), finish_reason: None })
        }
        async fn chat_stream(&self, _req: ChatRequest) -> Result<BoxStream<'static, Result<StreamEvent>>> {
            Err(Error::Internal("not implemented in mock".into()))
        }
        async fn embeddings(&self, _req: EmbeddingsRequest) -> Result<EmbeddingsResponse> {
            Ok(EmbeddingsResponse { embeddings: vec![] })
        }
        fn provider_id(&self) -> &str {
            "mock"
        }
    }

    #[test]
    fn resolve_splits_provider_and_model() {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(Mock));
        let (provider, model) = registry.resolve("mock/gpt-test").unwrap();
        assert_eq!(provider.provider_id(), "mock");
        assert_eq!(model, "gpt-test");
    }

    #[test]
    fn resolve_unknown_provider_errors() {
        let registry = ProviderRegistry::new();
        assert!(registry.resolve("nope/model").is_err());
    }
}
