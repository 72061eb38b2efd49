//! Anthropic messages API provider

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::env;

use super::{InferenceProvider, InferenceRequest};
use crate::error::{ProviderError, ProviderResult};

/// Anthropic inference provider. Overload responses (HTTP 429 and 529) are
/// mapped to [`ProviderError::Throttled`] so the gateway can back off.
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl AnthropicProvider {
    pub fn new(base_url: impl Into<String>) -> ProviderResult<Self> {
        let api_key = env::var("ANTHROPIC_API_KEY").map_err(|_| {
            ProviderError::Authentication(
                "ANTHROPIC_API_KEY environment variable not set".to_string(),
            )
        })?;

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url.into(),
        })
    }

    fn build_request_body(&self, request: &InferenceRequest) -> Value {
        json!({
            "model": request.model_id,
            "system": request.system,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "messages": request.messages,
        })
    }
}

#[async_trait]
impl InferenceProvider for AnthropicProvider {
    async fn invoke(&self, request: &InferenceRequest) -> ProviderResult<String> {
        let body = self.build_request_body(request);

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            // 429 is the rate limit, 529 the provider's own overload signal
            if status.as_u16() == 429 || status.as_u16() == 529 {
                return Err(ProviderError::Throttled(error_text));
            }
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(format!("Failed to parse response: {}", e)))?;

        let mut content = String::new();
        for block in &parsed.content {
            if block.block_type == "text" {
                if let Some(text) = &block.text {
                    content.push_str(text);
                }
            }
        }

        Ok(content)
    }
}

// Anthropic API response types

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}
