use serde::{Deserialize, Serialize};

/// Which agents the router selected for a query, plus a short rationale.
///
/// The field names mirror the JSON keys the classifier model is instructed
/// to emit; missing keys default to `false` so a partial object still parses.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoutingDecision {
    #[serde(default)]
    pub needs_order_info: bool,
    #[serde(default)]
    pub needs_promotion_info: bool,
    #[serde(default)]
    pub needs_product_info: bool,
    #[serde(default)]
    pub needs_graph_query: bool,
    #[serde(default)]
    pub needs_internet_search: bool,
    #[serde(default)]
    pub needs_vector_search: bool,
    #[serde(default)]
    pub reasoning: String,
}

impl RoutingDecision {
    /// Fail-open default: every agent enabled. Used whenever classification
    /// fails or its output cannot be parsed, so the user never receives an
    /// empty answer because classification broke.
    pub fn all_agents(reasoning: impl Into<String>) -> Self {
        Self {
            needs_order_info: true,
            needs_promotion_info: true,
            needs_product_info: true,
            needs_graph_query: true,
            needs_internet_search: true,
            needs_vector_search: true,
            reasoning: reasoning.into(),
        }
    }

    /// Number of agents this decision enables.
    pub fn selected_count(&self) -> usize {
        [
            self.needs_order_info,
            self.needs_promotion_info,
            self.needs_product_info,
            self.needs_graph_query,
            self.needs_internet_search,
            self.needs_vector_search,
        ]
        .iter()
        .filter(|enabled| **enabled)
        .count()
    }

    pub fn is_empty(&self) -> bool {
        self.selected_count() == 0
    }
}
