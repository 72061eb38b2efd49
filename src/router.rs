//! Query router: one classification call deciding which agents to dispatch

use std::sync::Arc;
use tracing::warn;

use crate::domain::RoutingDecision;
use crate::gateway::CallGateway;
use crate::providers::{ChatMessage, InferenceRequest};

const ROUTER_MAX_TOKENS: u32 = 300;
const ROUTER_TEMPERATURE: f32 = 0.1;

const ROUTER_SYSTEM_PROMPT: &str = r#"Bạn là trợ lý phân tích câu hỏi. Nhiệm vụ của bạn là phân tích câu hỏi của người dùng và xác định cần sử dụng những agent nào để trả lời.
Lưu ý: không sử dụng cụm từ TGDD, thay bằng cửa hàng Zaplap khi trả lời.

Các agent có sẵn:
1. OrderAgent - CHỈ dùng khi cần truy vấn thông tin về đơn hàng CỤ THỂ của người dùng, như trạng thái đơn hàng, lịch sử đơn hàng. KHÔNG dùng cho các câu hỏi chung về chính sách, quy trình đặt hàng, hoặc trả hàng.
2. PromotionAgent - Truy vấn thông tin về khuyến mãi, mã giảm giá
3. ProductAgent - Tìm kiếm thông tin chi tiết về sản phẩm cụ thể (laptop) khi người dùng hỏi về một sản phẩm cụ thể hoặc muốn tham khảo thông tin sản phẩm.
4. WebSearchAgent - Tìm kiếm thông tin trên internet cho các câu hỏi kiến thức chung, định nghĩa, so sánh, giải thích các khái niệm công nghệ không liên quan trực tiếp đến cửa hàng.
5. KnowledgeAgent - Tìm kiếm thông tin chung từ cơ sở dữ liệu vector, bao gồm các chính sách, quy trình, hướng dẫn, và các câu hỏi chung liên quan đến cửa hàng.
6. GraphAgent - Tìm kiếm thông tin sản phẩm phức tạp bằng cách tạo và thực thi truy vấn Cypher trên cơ sở dữ liệu đồ thị. Sử dụng cho các câu hỏi so sánh sản phẩm, lọc theo nhiều tiêu chí, hoặc tìm kiếm sản phẩm theo mối quan hệ.

Lưu ý quan trọng:
- Câu hỏi về "chính sách trả hàng", "chính sách bảo hành", "hướng dẫn mua hàng" là câu hỏi chung, chỉ cần dùng KnowledgeAgent.
- Chỉ dùng OrderAgent khi người dùng hỏi về đơn hàng cụ thể của họ, ví dụ: "đơn hàng của tôi đã giao chưa?", "tôi đã đặt những sản phẩm nào?"
- Dùng ProductAgent khi người dùng hỏi về thông tin sản phẩm cụ thể đơn giản, ví dụ: "cho tôi biết thông tin về laptop Dell XPS", "tôi muốn tham khảo sản phẩm Lenovo ThinkPad"
- Dùng GraphAgent khi người dùng hỏi về thông tin sản phẩm phức tạp hoặc so sánh, ví dụ: "laptop nào có RAM trên 16GB và giá dưới 30 triệu?", "so sánh các laptop Dell và Lenovo", "laptop nào có SSD lớn nhất?"
- Dùng WebSearchAgent khi người dùng hỏi về kiến thức chung, định nghĩa, so sánh, ví dụ: "SSD là gì?", "so sánh Intel và AMD", "RAM DDR4 và DDR5 khác nhau thế nào?"

Trả về JSON với cấu trúc:
{
  "needsOrderInfo": boolean,
  "needsPromotionInfo": boolean,
  "needsProductInfo": boolean,
  "needsGraphQuery": boolean,
  "needsInternetSearch": boolean,
  "needsVectorSearch": boolean,
  "reasoning": "Giải thích ngắn gọn lý do"
}"#;

pub struct QueryRouter {
    gateway: Arc<CallGateway>,
    model_id: String,
}

impl QueryRouter {
    /// `model_id` should be the cheap fallback model; classification never
    /// spends the primary model's quota.
    pub fn new(gateway: Arc<CallGateway>, model_id: String) -> Self {
        Self { gateway, model_id }
    }

    /// Classifies the question into a set of agents. Both failure modes
    /// (inference failure, unparsable output) degrade to the fail-open
    /// default enabling every agent.
    pub async fn classify(&self, question: &str) -> RoutingDecision {
        let request = InferenceRequest {
            model_id: self.model_id.clone(),
            system: ROUTER_SYSTEM_PROMPT.to_string(),
            messages: vec![ChatMessage::user(format!(
                "Phân tích câu hỏi sau: \"{}\"",
                question
            ))],
            max_tokens: ROUTER_MAX_TOKENS,
            temperature: ROUTER_TEMPERATURE,
        };

        match self.gateway.invoke_model(&request).await {
            Ok(text) => match extract_first_json(&text) {
                Some(decision) => decision,
                None => {
                    warn!("unparsable classification response, enabling all agents");
                    RoutingDecision::all_agents("Using all agents as fallback")
                }
            },
            Err(err) => {
                warn!("classification call failed ({}), enabling all agents", err);
                RoutingDecision::all_agents("Error occurred, using all agents as fallback")
            }
        }
    }
}

/// Best-effort parse of the first JSON object embedded in model output.
fn extract_first_json(text: &str) -> Option<RoutingDecision> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}
