//! Knowledge-base agent: embedding search over the store's document index

use async_trait::async_trait;
use std::sync::Arc;

use super::{contains_any, RetrievalAgent};
use crate::cache::SemanticCache;
use crate::domain::{AgentName, AgentPayload, ChatQuery};
use crate::error::{AgentError, ProviderError};
use crate::gateway::CallGateway;
use crate::stores::VectorIndex;

const TOP_K: u64 = 4;

const KNOWLEDGE_KEYWORDS: &[&str] = &[
    "chính sách",
    "quy trình",
    "hướng dẫn",
    "bảo hành",
    "trả hàng",
    "đổi trả",
    "mua hàng",
    "cửa hàng",
];

pub struct KnowledgeBaseAgent {
    gateway: Arc<CallGateway>,
    cache: Arc<SemanticCache>,
    vectors: Arc<dyn VectorIndex>,
}

impl KnowledgeBaseAgent {
    pub fn new(
        gateway: Arc<CallGateway>,
        cache: Arc<SemanticCache>,
        vectors: Arc<dyn VectorIndex>,
    ) -> Self {
        Self {
            gateway,
            cache,
            vectors,
        }
    }
}

#[async_trait]
impl RetrievalAgent for KnowledgeBaseAgent {
    fn name(&self) -> AgentName {
        AgentName::Knowledge
    }

    fn is_relevant(&self, question: &str) -> bool {
        contains_any(question, KNOWLEDGE_KEYWORDS)
    }

    fn unavailable_message(&self) -> &'static str {
        "Không thể tìm kiếm thông tin do hệ thống đang bận. Vui lòng thử lại sau."
    }

    async fn get_context(&self, query: &ChatQuery) -> Result<AgentPayload, AgentError> {
        if let Some(cached) = self.cache.get(&query.question).await {
            return Ok(AgentPayload::Text(cached));
        }

        let vector = match self.gateway.embed(&query.question).await {
            Ok(vector) => vector,
            Err(ProviderError::Throttled(_)) => {
                // Sustained overload even after the gateway's retries: serve
                // the newest cached entry as a stale stand-in if one exists.
                if let Some(stale) = self.cache.most_recent().await {
                    return Ok(AgentPayload::Text(format!(
                        "{}\n\n(Lưu ý: Đây là kết quả tạm thời do hệ thống đang quá tải)",
                        stale
                    )));
                }
                return Ok(AgentPayload::text(
                    "Hệ thống đang bận, vui lòng thử lại sau ít phút.",
                ));
            }
            Err(err) => return Err(err.into()),
        };

        let hits = self.vectors.nearest_neighbors(&vector, TOP_K).await?;
        let joined = hits
            .iter()
            .map(|hit| hit.text.as_str())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");

        let result = if joined.is_empty() {
            "Không tìm thấy thông tin về câu hỏi này.".to_string()
        } else {
            joined
        };

        self.cache.put(&query.question, &result).await;
        Ok(AgentPayload::Text(result))
    }
}
