//! Core domain types for query orchestration

mod format;
mod query;
mod result;
mod routing;

pub use format::format_vnd;
pub use query::{ChatQuery, Identity};
pub use result::{AgentName, AgentPayload, AgentResult, ChatAnswer, ProductOffer};
pub use routing::RoutingDecision;
