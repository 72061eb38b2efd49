//! Tavily web-search provider

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::env;

use super::{SearchHit, SearchOutcome, WebSearchProvider};
use crate::error::AgentError;

const DEFAULT_BASE_URL: &str = "https://api.tavily.com";

/// Web-search provider backed by the Tavily REST API.
pub struct TavilyClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl TavilyClient {
    pub fn new(base_url: Option<String>) -> Result<Self, AgentError> {
        let api_key = env::var("TAVILY_API_KEY").map_err(|_| {
            AgentError::Search("TAVILY_API_KEY environment variable not set".to_string())
        })?;

        Ok(Self {
            client: reqwest::Client::new(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
        })
    }
}

#[async_trait]
impl WebSearchProvider for TavilyClient {
    async fn search(&self, query: &str) -> Result<SearchOutcome, AgentError> {
        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .json(&json!({
                "api_key": self.api_key,
                "query": query,
                "include_answer": true,
            }))
            .send()
            .await
            .map_err(|e| AgentError::Search(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AgentError::Search(format!(
                "web search failed with status {}",
                status
            )));
        }

        let body: TavilyResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Parse(e.to_string()))?;

        Ok(SearchOutcome {
            answer: body.answer.filter(|answer| !answer.is_empty()),
            results: body
                .results
                .into_iter()
                .map(|result| SearchHit {
                    title: result.title,
                    content: result.content,
                    url: result.url,
                })
                .collect(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    answer: Option<String>,
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    url: String,
}
