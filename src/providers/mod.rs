//! External inference and embedding providers
//!
//! Both traits are consumed exclusively through the throttled call gateway,
//! which owns pacing and retry policy; implementations only perform the HTTP
//! exchange and map provider-signaled overload onto
//! [`ProviderError::Throttled`](crate::error::ProviderError).

mod anthropic;
mod openai;

pub use anthropic::AnthropicProvider;
pub use openai::OpenAiEmbeddingProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderResult;

/// Role of a chat message sent to the inference provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One chat message in an inference request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A single completion request routed through the gateway.
#[derive(Debug, Clone)]
pub struct InferenceRequest {
    pub model_id: String,
    pub system: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Trait for text-completion providers.
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Invoke the model and return the concatenated text content.
    async fn invoke(&self, request: &InferenceRequest) -> ProviderResult<String>;
}

/// Trait for text-embedding providers.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> ProviderResult<Vec<f32>>;
}
