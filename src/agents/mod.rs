//! Retrieval agents
//!
//! Each agent encapsulates one retrieval capability plus a cheap local
//! relevance heuristic. Agents degrade to explanatory text for domain-level
//! refusals (e.g. an unauthenticated order lookup); infrastructure failures
//! propagate as errors and are isolated by the fan-out executor.

mod graph;
mod knowledge;
mod order;
mod product;
mod promotion;
mod web_search;

pub use graph::GraphQueryAgent;
pub use knowledge::KnowledgeBaseAgent;
pub use order::OrderHistoryAgent;
pub use product::ProductCatalogAgent;
pub use promotion::PromotionAgent;
pub use web_search::WebSearchAgent;

use async_trait::async_trait;

use crate::domain::{AgentName, AgentPayload, ChatQuery};
use crate::error::AgentError;

/// Common contract of the six retrieval agent variants.
#[async_trait]
pub trait RetrievalAgent: Send + Sync {
    fn name(&self) -> AgentName;

    /// Keyword/regex heuristic over the raw question. Never an inference
    /// call.
    fn is_relevant(&self, question: &str) -> bool;

    /// User-facing text substituted by the executor when this agent fails.
    fn unavailable_message(&self) -> &'static str;

    /// Gathers this agent's textual (or structured) context for the query.
    async fn get_context(&self, query: &ChatQuery) -> Result<AgentPayload, AgentError>;
}

pub(crate) fn contains_any(question: &str, keywords: &[&str]) -> bool {
    let lowered = question.to_lowercase();
    keywords.iter().any(|keyword| lowered.contains(keyword))
}
