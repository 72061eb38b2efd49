//! Neo4j graph store over the HTTP transaction API

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::GraphStore;
use crate::error::AgentError;

/// Graph store speaking Neo4j's `tx/commit` HTTP endpoint.
pub struct Neo4jHttpStore {
    client: reqwest::Client,
    base_url: String,
    database: String,
    user: String,
    password: String,
}

impl Neo4jHttpStore {
    pub fn new(
        base_url: impl Into<String>,
        database: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            database: database.into(),
            user: user.into(),
            password: password.into(),
        }
    }
}

#[async_trait]
impl GraphStore for Neo4jHttpStore {
    async fn run(&self, cypher: &str) -> Result<Vec<Value>, AgentError> {
        let response = self
            .client
            .post(format!(
                "{}/db/{}/tx/commit",
                self.base_url, self.database
            ))
            .basic_auth(&self.user, Some(&self.password))
            .json(&json!({
                "statements": [{ "statement": cypher }]
            }))
            .send()
            .await
            .map_err(|e| AgentError::Store(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AgentError::Store(format!(
                "graph query failed with status {}",
                status
            )));
        }

        let body: TxCommitResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Parse(e.to_string()))?;

        if let Some(error) = body.errors.first() {
            return Err(AgentError::Store(format!(
                "{}: {}",
                error.code, error.message
            )));
        }

        let rows = body
            .results
            .into_iter()
            .next()
            .map(|result| {
                result
                    .data
                    .into_iter()
                    .filter_map(|datum| datum.row.into_iter().next())
                    .collect()
            })
            .unwrap_or_default();

        Ok(rows)
    }
}

#[derive(Debug, Deserialize)]
struct TxCommitResponse {
    #[serde(default)]
    results: Vec<TxResult>,
    #[serde(default)]
    errors: Vec<TxError>,
}

#[derive(Debug, Deserialize)]
struct TxResult {
    #[serde(default)]
    data: Vec<TxDatum>,
}

#[derive(Debug, Deserialize)]
struct TxDatum {
    #[serde(default)]
    row: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct TxError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}
