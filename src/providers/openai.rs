//! OpenAI-compatible embeddings provider

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::env;

use super::EmbeddingProvider;
use crate::error::{ProviderError, ProviderResult};

/// Embedding provider speaking the OpenAI `/embeddings` wire format.
pub struct OpenAiEmbeddingProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiEmbeddingProvider {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> ProviderResult<Self> {
        let api_key = env::var("OPENAI_API_KEY").map_err(|_| {
            ProviderError::Authentication("OPENAI_API_KEY environment variable not set".to_string())
        })?;

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url.into(),
            model: model.into(),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    async fn embed(&self, text: &str) -> ProviderResult<Vec<f32>> {
        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "input": text,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            if status.as_u16() == 429 {
                return Err(ProviderError::Throttled(error_text));
            }
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(format!("Failed to parse response: {}", e)))?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| ProviderError::Parse("embedding response had no data".to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}
