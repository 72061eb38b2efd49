//! Outbound collaborator interfaces
//!
//! The orchestration core consumes the commerce database, the graph
//! database, the vector index and the web-search provider only through these
//! narrow traits. Concrete implementations live beside them; tests inject
//! in-memory fakes.

mod neo4j;
mod postgres;
mod qdrant;
mod tavily;

pub use neo4j::Neo4jHttpStore;
pub use postgres::PostgresStores;
pub use qdrant::QdrantIndex;
pub use tavily::TavilyClient;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::AgentError;

/// One persisted customer order.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderRow {
    pub id: i64,
    pub total_amount: f64,
    pub order_status: String,
    pub payment_status: String,
    pub created_at: DateTime<Utc>,
}

/// One currently-active promotion.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PromotionRow {
    pub code: String,
    pub description: String,
    pub discount_type: String,
    pub discount_value: f64,
}

/// One catalog product with its laptop spec columns.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub name: String,
    pub brand: Option<String>,
    pub price: f64,
    pub processor_name: Option<String>,
    pub processor_brand: Option<String>,
    pub ram: Option<String>,
    pub ssd: Option<String>,
    pub hdd: Option<String>,
    pub display_type: Option<String>,
    pub display_inches: Option<f64>,
}

/// One scored vector-search hit.
#[derive(Debug, Clone)]
pub struct ScoredPoint {
    pub score: f32,
    pub text: String,
}

/// One web-search result.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub title: String,
    pub content: String,
    pub url: String,
}

/// Web-search outcome: an optional directly-synthesized answer plus raw hits.
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    pub answer: Option<String>,
    pub results: Vec<SearchHit>,
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Most recent orders for one customer, newest first. Never crosses
    /// identities.
    async fn list_recent(&self, customer_id: i64, limit: i64)
        -> Result<Vec<OrderRow>, AgentError>;
}

#[async_trait]
pub trait PromotionStore: Send + Sync {
    /// Promotions whose time window covers now.
    async fn list_active(&self) -> Result<Vec<PromotionRow>, AgentError>;
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Name-or-CPU substring search over the catalog.
    async fn search(&self, text: &str, limit: i64) -> Result<Vec<ProductRow>, AgentError>;
}

#[async_trait]
pub trait CartStore: Send + Sync {
    async fn add_item(
        &self,
        customer_id: i64,
        product_id: i64,
        quantity: i32,
    ) -> Result<(), AgentError>;
}

#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Runs one Cypher statement and returns the first column of each row.
    async fn run(&self, cypher: &str) -> Result<Vec<Value>, AgentError>;
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn nearest_neighbors(
        &self,
        vector: &[f32],
        k: u64,
    ) -> Result<Vec<ScoredPoint>, AgentError>;
}

#[async_trait]
pub trait WebSearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<SearchOutcome, AgentError>;
}
