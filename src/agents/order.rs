//! Order-history agent: personal order lookups for authenticated customers

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::{contains_any, RetrievalAgent};
use crate::domain::{format_vnd, AgentName, AgentPayload, ChatQuery};
use crate::error::AgentError;
use crate::stores::{OrderRow, OrderStore};

const RECENT_ORDER_LIMIT: i64 = 3;

/// Phrases that directly indicate a question about the caller's own orders.
const ORDER_KEYWORDS: &[&str] = &[
    "đơn hàng của tôi",
    "đơn của tôi",
    "mã đơn của tôi",
    "my order",
    "tôi đã đặt",
    "tôi mua",
    "tôi đã mua",
    "tracking đơn hàng",
    "vận chuyển đơn hàng của tôi",
    "giao hàng của tôi",
    "tình trạng đơn hàng",
    "shipping của tôi",
    "tôi đã thanh toán",
    "hóa đơn của tôi",
];

const ORDER_WORDS: &[&str] = &["đơn hàng", "order", "mua", "thanh toán"];
const PERSONAL_WORDS: &[&str] = &["tôi", "của mình", "của tôi", "mình", "của em"];

pub struct OrderHistoryAgent {
    orders: Arc<dyn OrderStore>,
}

impl OrderHistoryAgent {
    pub fn new(orders: Arc<dyn OrderStore>) -> Self {
        Self { orders }
    }

    fn format_orders(rows: &[OrderRow]) -> String {
        rows.iter()
            .map(|order| {
                let payment = if order.payment_status == "paid" {
                    "Đã thanh toán"
                } else {
                    "Chưa thanh toán"
                };
                format!(
                    "• Đơn #{} – {}\n  • Trạng thái: {}\n  • Thanh toán: {}\n  • Tạo lúc: {}",
                    order.id,
                    format_vnd(order.total_amount),
                    order.order_status,
                    payment,
                    format_date(order.created_at),
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

fn format_date(value: DateTime<Utc>) -> String {
    value.format("%d/%m/%Y %H:%M:%S").to_string()
}

#[async_trait]
impl RetrievalAgent for OrderHistoryAgent {
    fn name(&self) -> AgentName {
        AgentName::Order
    }

    fn is_relevant(&self, question: &str) -> bool {
        if contains_any(question, ORDER_KEYWORDS) {
            return true;
        }
        // Otherwise require both an order word and first-person context, so
        // generic policy questions ("quy trình đặt hàng") stay out.
        contains_any(question, ORDER_WORDS) && contains_any(question, PERSONAL_WORDS)
    }

    fn unavailable_message(&self) -> &'static str {
        "Không thể truy vấn thông tin đơn hàng."
    }

    async fn get_context(&self, query: &ChatQuery) -> Result<AgentPayload, AgentError> {
        let Some(identity) = &query.identity else {
            return Ok(AgentPayload::text(
                "Bạn cần đăng nhập để xem thông tin đơn hàng của mình.",
            ));
        };

        let rows = self
            .orders
            .list_recent(identity.customer_id, RECENT_ORDER_LIMIT)
            .await?;

        if rows.is_empty() {
            return Ok(AgentPayload::text("Bạn chưa có đơn hàng nào."));
        }

        Ok(AgentPayload::text(format!(
            "Đơn hàng của bạn:\n{}",
            Self::format_orders(&rows)
        )))
    }
}
