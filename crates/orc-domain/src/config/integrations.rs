use serde::{Deserialize, Serialize};

/// `integrations` config section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrationsConfig {
    pub crawl4ai: Crawl4aiConfig,
}

/// `integrations.crawl4ai`: connection details for the web-crawl tool's
/// external backend (out of scope; contract only).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Crawl4aiConfig {
    pub api_url: String,
    pub api_token: Option<String>,
    pub enabled: bool,
}

impl Default for Crawl4aiConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            api_token: None,
            enabled: false,
        }
    }
}
