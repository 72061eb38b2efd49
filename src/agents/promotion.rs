//! Promotion agent: currently-active discount codes

use async_trait::async_trait;
use std::sync::Arc;

use super::{contains_any, RetrievalAgent};
use crate::domain::{format_vnd, AgentName, AgentPayload, ChatQuery};
use crate::error::AgentError;
use crate::stores::{PromotionRow, PromotionStore};

const PROMO_KEYWORDS: &[&str] = &[
    "mã giảm giá",
    "khuyến mãi",
    "promo",
    "promotion",
    "mã khuyến mãi",
    "giảm bao nhiêu",
    "được giảm",
    "discount",
    "voucher",
    "ưu đãi",
];

pub struct PromotionAgent {
    promotions: Arc<dyn PromotionStore>,
}

impl PromotionAgent {
    pub fn new(promotions: Arc<dyn PromotionStore>) -> Self {
        Self { promotions }
    }

    fn format_discount(promotion: &PromotionRow) -> String {
        if promotion.discount_type == "percentage" {
            if promotion.discount_value.fract() == 0.0 {
                format!("{}%", promotion.discount_value as i64)
            } else {
                format!("{}%", promotion.discount_value)
            }
        } else {
            format_vnd(promotion.discount_value)
        }
    }
}

#[async_trait]
impl RetrievalAgent for PromotionAgent {
    fn name(&self) -> AgentName {
        AgentName::Promotion
    }

    fn is_relevant(&self, question: &str) -> bool {
        contains_any(question, PROMO_KEYWORDS)
    }

    fn unavailable_message(&self) -> &'static str {
        "Không thể truy vấn thông tin khuyến mãi."
    }

    async fn get_context(&self, _query: &ChatQuery) -> Result<AgentPayload, AgentError> {
        let rows = self.promotions.list_active().await?;

        if rows.is_empty() {
            return Ok(AgentPayload::text(
                "Hiện không có khuyến mãi nào đang hoạt động.",
            ));
        }

        let list = rows
            .iter()
            .map(|promotion| {
                format!(
                    "• Mã `{}`: {} (Giảm {})",
                    promotion.code,
                    promotion.description,
                    Self::format_discount(promotion)
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        Ok(AgentPayload::text(format!(
            "Các khuyến mãi đang có:\n{}",
            list
        )))
    }
}
