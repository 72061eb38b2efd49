//! Qdrant vector index over its REST search API

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{ScoredPoint, VectorIndex};
use crate::error::AgentError;

/// Vector index speaking Qdrant's `points/search` REST endpoint.
pub struct QdrantIndex {
    client: reqwest::Client,
    base_url: String,
    collection: String,
    api_key: Option<String>,
}

impl QdrantIndex {
    pub fn new(
        base_url: impl Into<String>,
        collection: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            collection: collection.into(),
            api_key,
        }
    }
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn nearest_neighbors(
        &self,
        vector: &[f32],
        k: u64,
    ) -> Result<Vec<ScoredPoint>, AgentError> {
        let mut request = self
            .client
            .post(format!(
                "{}/collections/{}/points/search",
                self.base_url, self.collection
            ))
            .json(&json!({
                "vector": vector,
                "limit": k,
                "with_payload": true,
            }));
        if let Some(api_key) = &self.api_key {
            request = request.header("api-key", api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AgentError::Store(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AgentError::Store(format!(
                "vector search failed with status {}",
                status
            )));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Parse(e.to_string()))?;

        Ok(body
            .result
            .into_iter()
            .map(|point| ScoredPoint {
                score: point.score,
                text: point.payload.text.unwrap_or_default(),
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    result: Vec<SearchPoint>,
}

#[derive(Debug, Deserialize)]
struct SearchPoint {
    score: f32,
    #[serde(default)]
    payload: PointPayload,
}

#[derive(Debug, Default, Deserialize)]
struct PointPayload {
    text: Option<String>,
}
