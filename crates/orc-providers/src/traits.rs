//! The provider-agnostic LLM contract (spec §1 OUT OF SCOPE: "third-party
//! model SDKs"). Concrete adapters for Anthropic, OpenAI-compatible, Google,
//! and Bedrock endpoints are external collaborators; this crate defines only
//! the shape the gateway's turn loop calls against.

use orc_domain::error::Result;
use orc_domain::stream::{BoxStream, StreamEvent, Usage};
use orc_domain::tool::{Message, ToolCall, ToolDefinition};

/// A provider-agnostic chat completion request.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub json_mode: bool,
    /// Model identifier override. When `None`, the provider uses its default.
    pub model: Option<String>,
}

/// A provider-agnostic chat completion response.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
    pub usage: Option<Usage>,
    pub model: String,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EmbeddingsRequest {
    pub input: Vec<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EmbeddingsResponse {
    pub embeddings: Vec<Vec<f32>>,
}

/// Trait every LLM adapter implements. Implementations translate between the
/// types above and a provider's own wire format; none ship in this repo.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    async fn chat(&self, req: ChatRequest) -> Result<ChatResponse>;

    async fn chat_stream(&self, req: ChatRequest) -> Result<BoxStream<'static, Result<StreamEvent>>>;

    async fn embeddings(&self, req: EmbeddingsRequest) -> Result<EmbeddingsResponse>;

    /// A unique identifier for this provider instance, matching the
    /// `provider_id` half of an agent's `"provider_id/model_name"` model
    /// string.
    fn provider_id(&self) -> &str;
}
