//! Response synthesizer: merges agent results into one final answer

use std::sync::Arc;
use tracing::error;

use crate::domain::{AgentResult, ChatAnswer, ProductOffer};
use crate::gateway::CallGateway;
use crate::providers::{ChatMessage, InferenceRequest};

const SYNTHESIS_MAX_TOKENS: u32 = 700;
const SYNTHESIS_TEMPERATURE: f32 = 0.3;

/// At most one other (non-substantive) result may accompany a structured
/// offer for it to be returned directly.
const OFFER_PASSTHROUGH_MAX_RESULTS: usize = 2;

const SYNTHESIS_SYSTEM_PROMPT: &str = "Bạn là trợ lý TMĐT, trả lời ngắn gọn, thân thiện, tiếng Việt.\n\
    Lưu ý: không sử dụng cụm từ TGDD, thay bằng cửa hàng Zaplap khi trả lời.\n\
    Nhiệm vụ của bạn là tổng hợp thông tin từ các agent khác nhau để tạo câu trả lời hoàn chỉnh.\n\
    Chỉ sử dụng thông tin được cung cấp, không tự thêm thông tin không có trong dữ liệu.\n\
    Nếu thiếu thông tin, hãy yêu cầu người dùng cung cấp thêm chi tiết.";

pub struct ResponseSynthesizer {
    gateway: Arc<CallGateway>,
    model_id: String,
}

impl ResponseSynthesizer {
    /// `model_id` is the cheap fallback model; synthesis always runs on it to
    /// keep the primary model's quota for query generation.
    pub fn new(gateway: Arc<CallGateway>, model_id: String) -> Self {
        Self { gateway, model_id }
    }

    pub async fn synthesize(&self, question: &str, results: &[AgentResult]) -> ChatAnswer {
        // A lone product offer bypasses inference so its confirmation fields
        // reach the caller unmodified; the accompanying result is dropped as
        // a duplicate of the offer.
        if let Some(offer) = Self::sole_offer(results) {
            return ChatAnswer::Offer(offer.clone());
        }

        let context = results
            .iter()
            .map(|result| {
                let text = result.payload.as_text();
                let text = if text.trim().is_empty() {
                    "Không có thông tin"
                } else {
                    text
                };
                format!("- {}: {}", result.agent, text)
            })
            .collect::<Vec<_>>()
            .join("\n");

        let request = InferenceRequest {
            model_id: self.model_id.clone(),
            system: SYNTHESIS_SYSTEM_PROMPT.to_string(),
            messages: vec![ChatMessage::user(format!(
                "Câu hỏi: {}\n\nThông tin từ các agent:\n{}\n\nHãy tổng hợp thành câu trả lời hoàn chỉnh.",
                question, context
            ))],
            max_tokens: SYNTHESIS_MAX_TOKENS,
            temperature: SYNTHESIS_TEMPERATURE,
        };

        match self.gateway.invoke_model(&request).await {
            Ok(answer) => ChatAnswer::Text(answer),
            Err(err) => {
                error!("synthesis failed after retries: {}", err);
                ChatAnswer::Text(Self::concatenated_fallback(results))
            }
        }
    }

    /// Last-resort answer when synthesis is unavailable: the raw agent texts,
    /// or a static apology when none exist.
    fn concatenated_fallback(results: &[AgentResult]) -> String {
        let mut answer = String::from("Tôi đã tìm được thông tin sau:\n\n");
        let mut any = false;
        for result in results {
            let text = result.payload.as_text();
            if !text.trim().is_empty() {
                answer.push_str(text);
                answer.push_str("\n\n");
                any = true;
            }
        }
        if !any {
            return "Xin lỗi, hiện tại hệ thống đang quá tải. Vui lòng thử lại sau ít phút."
                .to_string();
        }
        answer
    }

    fn sole_offer(results: &[AgentResult]) -> Option<&ProductOffer> {
        let mut offers = results
            .iter()
            .filter(|result| !result.is_error)
            .filter_map(|result| result.payload.as_offer());
        let first = offers.next()?;
        if offers.next().is_some() || results.len() > OFFER_PASSTHROUGH_MAX_RESULTS {
            return None;
        }
        Some(first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AgentName, AgentPayload};
    use crate::error::{ProviderError, ProviderResult};
    use crate::gateway::ThrottlePolicy;
    use crate::providers::{EmbeddingProvider, InferenceProvider};
    use async_trait::async_trait;
    use std::time::Duration;

    enum Script {
        Echo,
        Throttle,
    }

    struct ScriptedInference(Script);

    #[async_trait]
    impl InferenceProvider for ScriptedInference {
        async fn invoke(&self, request: &InferenceRequest) -> ProviderResult<String> {
            match self.0 {
                Script::Echo => Ok(request.messages[0].content.clone()),
                Script::Throttle => Err(ProviderError::Throttled("busy".to_string())),
            }
        }
    }

    struct NoopEmbedding;

    #[async_trait]
    impl EmbeddingProvider for NoopEmbedding {
        async fn embed(&self, _text: &str) -> ProviderResult<Vec<f32>> {
            Ok(vec![])
        }
    }

    fn synthesizer(script: Script) -> ResponseSynthesizer {
        let policy = ThrottlePolicy {
            min_spacing: Duration::ZERO,
            max_retries: 0,
            initial_backoff: Duration::ZERO,
        };
        let gateway = Arc::new(CallGateway::new(
            Arc::new(ScriptedInference(script)),
            Arc::new(NoopEmbedding),
            policy.clone(),
            policy,
        ));
        ResponseSynthesizer::new(gateway, "claude-3-haiku-20240307".to_string())
    }

    fn offer_result() -> AgentResult {
        AgentResult::ok(
            AgentName::Product,
            AgentPayload::Offer(ProductOffer {
                product_id: 12,
                product_name: "Dell XPS 13".to_string(),
                price: 25_000_000.0,
                text: "• Dell XPS 13".to_string(),
                awaiting_confirmation: true,
            }),
        )
    }

    fn text_result(agent: AgentName, text: &str) -> AgentResult {
        AgentResult::ok(agent, AgentPayload::text(text))
    }

    #[tokio::test]
    async fn lone_offer_bypasses_inference() {
        let synthesizer = synthesizer(Script::Throttle);
        let results = vec![offer_result(), text_result(AgentName::Knowledge, "chính sách")];
        let answer = synthesizer.synthesize("laptop Dell", &results).await;
        let ChatAnswer::Offer(offer) = answer else {
            panic!("expected offer passthrough");
        };
        assert!(offer.awaiting_confirmation);
    }

    #[tokio::test]
    async fn offer_among_many_results_is_flattened() {
        let synthesizer = synthesizer(Script::Echo);
        let results = vec![
            offer_result(),
            text_result(AgentName::Knowledge, "chính sách"),
            text_result(AgentName::Promotion, "khuyến mãi"),
        ];
        let answer = synthesizer.synthesize("laptop Dell", &results).await;
        let ChatAnswer::Text(text) = answer else {
            panic!("expected synthesized text");
        };
        // The offer's text form participates in the synthesis input.
        assert!(text.contains("• Dell XPS 13"));
        assert!(text.contains("ProductAgent"));
    }

    #[tokio::test]
    async fn overload_falls_back_to_concatenation() {
        let synthesizer = synthesizer(Script::Throttle);
        let results = vec![
            text_result(AgentName::Knowledge, "chính sách trả hàng 7 ngày"),
            text_result(AgentName::Promotion, ""),
        ];
        let answer = synthesizer.synthesize("chính sách", &results).await;
        let ChatAnswer::Text(text) = answer else {
            panic!("expected text");
        };
        assert!(text.starts_with("Tôi đã tìm được thông tin sau:"));
        assert!(text.contains("chính sách trả hàng 7 ngày"));
    }

    #[tokio::test]
    async fn overload_with_no_text_apologizes() {
        let synthesizer = synthesizer(Script::Throttle);
        let results = vec![text_result(AgentName::Promotion, "  ")];
        let answer = synthesizer.synthesize("câu hỏi", &results).await;
        assert_eq!(
            answer,
            ChatAnswer::text(
                "Xin lỗi, hiện tại hệ thống đang quá tải. Vui lòng thử lại sau ít phút."
            )
        );
    }
}
