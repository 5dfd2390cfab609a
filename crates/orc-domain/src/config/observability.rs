use serde::{Deserialize, Serialize};

/// Logging/tracing configuration. Not named in the distilled spec's
/// recognized sections, but carried regardless per the ambient-stack rule:
/// a Non-goal excluding metrics does not excuse bare stdlib logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// `compact`, `pretty`, or `json`.
    pub log_format: String,
    pub otlp_endpoint: Option<String>,
    pub service_name: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: "compact".to_string(),
            otlp_endpoint: None,
            service_name: "orchestrator".to_string(),
        }
    }
}
