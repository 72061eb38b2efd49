//! Error types for the chat orchestration service

use thiserror::Error;

/// Errors raised by the external inference/embedding providers.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider signaled overload (HTTP 429/529). Retried by the gateway.
    #[error("provider throttled: {0}")]
    Throttled(String),

    /// Non-overload API error
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Authentication error
    #[error("authentication error: {0}")]
    Authentication(String),

    /// Network error
    #[error("network error: {0}")]
    Network(String),

    /// Parse error
    #[error("parse error: {0}")]
    Parse(String),

    /// Request timed out
    #[error("request timed out")]
    Timeout,
}

impl ProviderError {
    /// Whether the gateway should retry this error with backoff.
    pub fn is_throttled(&self) -> bool {
        matches!(self, ProviderError::Throttled(_))
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else if err.is_connect() {
            ProviderError::Network(format!("Connection error: {}", err))
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

/// Errors raised while an agent gathers context. Each agent failure is
/// isolated by the fan-out executor and never reaches the caller directly.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Inference or embedding provider failure
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Relational, graph or vector store failure
    #[error("store error: {0}")]
    Store(String),

    /// External search failure
    #[error("search error: {0}")]
    Search(String),

    /// Malformed data from a collaborator
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<sqlx::Error> for AgentError {
    fn from(err: sqlx::Error) -> Self {
        AgentError::Store(err.to_string())
    }
}

impl From<serde_json::Error> for AgentError {
    fn from(err: serde_json::Error) -> Self {
        AgentError::Parse(err.to_string())
    }
}

/// Result type alias for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;
