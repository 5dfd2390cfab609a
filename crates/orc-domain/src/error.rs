//! Shared error type used across every orchestrator crate.

/// The abstract error kinds from the error-handling design, realized as one
/// enum so every crate propagates through a single `Result` alias.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unknown resource: {0}")]
    UnknownResource(String),

    #[error("transfer denied: {from} -> {to}")]
    TransferDenied { from: String, to: String },

    #[error("tool '{tool}' timed out after {elapsed_ms}ms")]
    ToolTimeout { tool: String, elapsed_ms: u64 },

    #[error("request timed out after {elapsed_ms}ms")]
    RequestTimeout { elapsed_ms: u64 },

    #[error("connection reset: {0}")]
    ConnectionReset(String),

    #[error("authentication rejected: {0}")]
    AuthRejected(String),

    #[error("payload too large: {actual} bytes (limit {limit})")]
    PayloadTooLarge { actual: usize, limit: usize },

    #[error("persistence failed: {0}")]
    Persistence(String),

    #[error("session busy: {0}")]
    SessionBusy(String),

    #[error("config: {0}")]
    Config(String),

    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("internal: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Abstract error kind, used for logging and for the HTTP status mapping
    /// in `orc-gateway`.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidInput(_) => "invalid_input",
            Error::UnknownResource(_) => "unknown_resource",
            Error::TransferDenied { .. } => "transfer_denied",
            Error::ToolTimeout { .. } => "tool_timeout",
            Error::RequestTimeout { .. } => "request_timeout",
            Error::ConnectionReset(_) => "connection_reset",
            Error::AuthRejected(_) => "auth_rejected",
            Error::PayloadTooLarge { .. } => "payload_too_large",
            Error::Persistence(_) => "persistence_error",
            Error::SessionBusy(_) => "session_busy",
            Error::Config(_) => "config",
            Error::Io(_) | Error::Json(_) => "internal",
            Error::Internal(_) => "internal",
        }
    }
}
