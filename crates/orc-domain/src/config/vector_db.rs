use serde::{Deserialize, Serialize};

/// `vector_db` config section. The vector store itself is an external
/// collaborator (spec §1 OUT OF SCOPE); this is only the connection
/// contract used by the crawl tool's stub handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorDbConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub collection: String,
}

impl Default for VectorDbConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: None,
            collection: "default".to_string(),
        }
    }
}
