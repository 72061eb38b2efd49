//! Fan-out executor: concurrent agent dispatch with bulkhead isolation

use futures::future::join_all;
use std::sync::Arc;
use tracing::error;

use crate::agents::RetrievalAgent;
use crate::domain::{AgentResult, ChatQuery, RoutingDecision};

/// Outcome of one fan-out, settled before synthesis.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// No agent was selected and no result exists.
    NoAgents,
    /// Every selected agent failed; synthesis must not be invoked.
    AllFailed,
    /// At least one usable result.
    Results(Vec<AgentResult>),
}

pub struct FanOutExecutor {
    order: Arc<dyn RetrievalAgent>,
    promotion: Arc<dyn RetrievalAgent>,
    product: Arc<dyn RetrievalAgent>,
    graph: Arc<dyn RetrievalAgent>,
    web: Arc<dyn RetrievalAgent>,
    knowledge: Arc<dyn RetrievalAgent>,
}

impl FanOutExecutor {
    pub fn new(
        order: Arc<dyn RetrievalAgent>,
        promotion: Arc<dyn RetrievalAgent>,
        product: Arc<dyn RetrievalAgent>,
        graph: Arc<dyn RetrievalAgent>,
        web: Arc<dyn RetrievalAgent>,
        knowledge: Arc<dyn RetrievalAgent>,
    ) -> Self {
        Self {
            order,
            promotion,
            product,
            graph,
            web,
            knowledge,
        }
    }

    /// Dispatches the selected agents and collects their settled results.
    ///
    /// The web-search agent is also dispatched when its own relevance
    /// heuristic fires, even if the router left it out, and it is awaited
    /// before the concurrent batch is joined.
    pub async fn dispatch(
        &self,
        query: &ChatQuery,
        decision: &RoutingDecision,
    ) -> DispatchOutcome {
        let mut results = Vec::new();

        // NOTE: this pre-await serializes web search ahead of the fan-out,
        // unlike the bulkhead used for every other agent. Kept to match the
        // observed system; the ordering is pinned by a test in case it turns
        // out to be an oversight rather than a guarantee.
        if decision.needs_internet_search || self.web.is_relevant(&query.question) {
            results.push(Self::run_agent(self.web.as_ref(), query).await);
        }

        let mut pending = Vec::new();
        if decision.needs_vector_search {
            pending.push(Self::run_agent(self.knowledge.as_ref(), query));
        }
        if decision.needs_order_info {
            pending.push(Self::run_agent(self.order.as_ref(), query));
        }
        if decision.needs_promotion_info {
            pending.push(Self::run_agent(self.promotion.as_ref(), query));
        }
        if decision.needs_product_info {
            pending.push(Self::run_agent(self.product.as_ref(), query));
        }
        if decision.needs_graph_query {
            pending.push(Self::run_agent(self.graph.as_ref(), query));
        }

        results.extend(join_all(pending).await);

        if results.is_empty() {
            return DispatchOutcome::NoAgents;
        }
        if results.iter().all(|result| result.is_error) {
            return DispatchOutcome::AllFailed;
        }
        DispatchOutcome::Results(results)
    }

    /// Runs one agent, converting any failure into a degraded result so that
    /// no single agent can take the whole fan-out down.
    async fn run_agent(agent: &dyn RetrievalAgent, query: &ChatQuery) -> AgentResult {
        match agent.get_context(query).await {
            Ok(payload) => AgentResult::ok(agent.name(), payload),
            Err(err) => {
                error!("{} failed: {}", agent.name(), err);
                AgentResult::degraded(agent.name(), agent.unavailable_message())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::RetrievalAgent;
    use crate::domain::{AgentName, AgentPayload};
    use crate::error::AgentError;
    use async_trait::async_trait;

    struct StubAgent {
        name: AgentName,
        relevant: bool,
        fail: bool,
    }

    #[async_trait]
    impl RetrievalAgent for StubAgent {
        fn name(&self) -> AgentName {
            self.name
        }

        fn is_relevant(&self, _question: &str) -> bool {
            self.relevant
        }

        fn unavailable_message(&self) -> &'static str {
            "degraded"
        }

        async fn get_context(&self, _query: &ChatQuery) -> Result<AgentPayload, AgentError> {
            if self.fail {
                Err(AgentError::Store("down".to_string()))
            } else {
                Ok(AgentPayload::text(format!("context from {}", self.name)))
            }
        }
    }

    fn stub(name: AgentName, fail: bool) -> Arc<dyn RetrievalAgent> {
        Arc::new(StubAgent {
            name,
            relevant: false,
            fail,
        })
    }

    fn executor(failing: &[AgentName]) -> FanOutExecutor {
        let fails = |name: AgentName| failing.contains(&name);
        FanOutExecutor::new(
            stub(AgentName::Order, fails(AgentName::Order)),
            stub(AgentName::Promotion, fails(AgentName::Promotion)),
            stub(AgentName::Product, fails(AgentName::Product)),
            stub(AgentName::Graph, fails(AgentName::Graph)),
            stub(AgentName::WebSearch, fails(AgentName::WebSearch)),
            stub(AgentName::Knowledge, fails(AgentName::Knowledge)),
        )
    }

    #[tokio::test]
    async fn failed_agents_become_degraded_results_not_cancellations() {
        let executor = executor(&[AgentName::Order, AgentName::Graph]);
        let decision = RoutingDecision::all_agents("test");
        let outcome = executor
            .dispatch(&ChatQuery::anonymous("câu hỏi"), &decision)
            .await;

        let DispatchOutcome::Results(results) = outcome else {
            panic!("expected results");
        };
        // All six dispatched; the two failures are isolated and marked.
        assert_eq!(results.len(), 6);
        assert_eq!(results.iter().filter(|r| r.is_error).count(), 2);
        assert_eq!(results.iter().filter(|r| !r.is_error).count(), 4);
    }

    #[tokio::test]
    async fn all_failures_short_circuit_without_synthesis() {
        let executor = executor(&[
            AgentName::Order,
            AgentName::Promotion,
            AgentName::Product,
            AgentName::Graph,
            AgentName::WebSearch,
            AgentName::Knowledge,
        ]);
        let decision = RoutingDecision::all_agents("test");
        let outcome = executor
            .dispatch(&ChatQuery::anonymous("câu hỏi"), &decision)
            .await;
        assert!(matches!(outcome, DispatchOutcome::AllFailed));
    }

    #[tokio::test]
    async fn empty_selection_yields_no_agents() {
        let executor = executor(&[]);
        let outcome = executor
            .dispatch(&ChatQuery::anonymous("câu hỏi"), &RoutingDecision::default())
            .await;
        assert!(matches!(outcome, DispatchOutcome::NoAgents));
    }

    #[tokio::test]
    async fn web_search_result_is_collected_first() {
        // Pins the serialization quirk: web search settles before the
        // concurrent batch, so its result leads the collection. Revisit if
        // the pre-await is ever confirmed to be an oversight.
        let executor = executor(&[]);
        let decision = RoutingDecision::all_agents("test");
        let DispatchOutcome::Results(results) = executor
            .dispatch(&ChatQuery::anonymous("câu hỏi"), &decision)
            .await
        else {
            panic!("expected results");
        };
        assert_eq!(results[0].agent, AgentName::WebSearch);
    }

    #[tokio::test]
    async fn web_search_relevance_overrides_router_omission() {
        let mut decision = RoutingDecision::default();
        decision.needs_promotion_info = true;
        let executor = FanOutExecutor::new(
            stub(AgentName::Order, false),
            stub(AgentName::Promotion, false),
            stub(AgentName::Product, false),
            stub(AgentName::Graph, false),
            Arc::new(StubAgent {
                name: AgentName::WebSearch,
                relevant: true,
                fail: false,
            }),
            stub(AgentName::Knowledge, false),
        );
        let DispatchOutcome::Results(results) = executor
            .dispatch(&ChatQuery::anonymous("SSD là gì"), &decision)
            .await
        else {
            panic!("expected results");
        };
        assert!(results.iter().any(|r| r.agent == AgentName::WebSearch));
    }
}
