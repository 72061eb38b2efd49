use serde::{Deserialize, Serialize};
use std::fmt;

/// The six retrieval agent variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AgentName {
    Order,
    Promotion,
    Product,
    Graph,
    WebSearch,
    Knowledge,
}

impl AgentName {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentName::Order => "OrderAgent",
            AgentName::Promotion => "PromotionAgent",
            AgentName::Product => "ProductAgent",
            AgentName::Graph => "GraphAgent",
            AgentName::WebSearch => "WebSearchAgent",
            AgentName::Knowledge => "KnowledgeAgent",
        }
    }
}

impl fmt::Display for AgentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A product match plus a pending add-to-cart confirmation.
///
/// Returned directly to the caller (bypassing synthesis) so the confirmation
/// fields reach the client unmodified.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductOffer {
    pub product_id: i64,
    pub product_name: String,
    pub price: f64,
    pub text: String,
    pub awaiting_confirmation: bool,
}

/// What one agent produced: plain text, or a structured product offer.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum AgentPayload {
    Text(String),
    Offer(ProductOffer),
}

impl AgentPayload {
    pub fn text(value: impl Into<String>) -> Self {
        AgentPayload::Text(value.into())
    }

    /// Flattened text form, used when the payload is fed to the synthesizer.
    pub fn as_text(&self) -> &str {
        match self {
            AgentPayload::Text(text) => text,
            AgentPayload::Offer(offer) => &offer.text,
        }
    }

    pub fn as_offer(&self) -> Option<&ProductOffer> {
        match self {
            AgentPayload::Offer(offer) => Some(offer),
            AgentPayload::Text(_) => None,
        }
    }
}

/// One agent's settled outcome, owned by the fan-out executor until it is
/// handed to the synthesizer.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AgentResult {
    pub agent: AgentName,
    pub payload: AgentPayload,
    pub is_error: bool,
}

impl AgentResult {
    pub fn ok(agent: AgentName, payload: AgentPayload) -> Self {
        Self {
            agent,
            payload,
            is_error: false,
        }
    }

    pub fn degraded(agent: AgentName, message: impl Into<String>) -> Self {
        Self {
            agent,
            payload: AgentPayload::text(message),
            is_error: true,
        }
    }
}

/// The final answer returned to the caller.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ChatAnswer {
    Text(String),
    Offer(ProductOffer),
}

impl ChatAnswer {
    pub fn text(value: impl Into<String>) -> Self {
        ChatAnswer::Text(value.into())
    }
}
