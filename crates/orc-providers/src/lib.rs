//! The LLM provider contract (spec §1 OUT OF SCOPE: third-party model SDKs
//! are external collaborators, specified only by this contract).

pub mod registry;
pub mod traits;

pub use registry::ProviderRegistry;
pub use traits::{ChatRequest, ChatResponse, EmbeddingsRequest, EmbeddingsResponse, LlmProvider};
