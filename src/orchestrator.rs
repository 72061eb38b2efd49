//! Chat orchestrator: the request pipeline
//!
//! Pending-confirmation short-circuit → router → fan-out → synthesis →
//! pending-state recording. Every failure path degrades to a best-effort
//! Vietnamese answer; the caller never sees a raw provider error.

use std::sync::Arc;
use tracing::{error, info};

use crate::conversation::{ConversationTracker, PendingAction};
use crate::domain::{ChatAnswer, ChatQuery, Identity};
use crate::executor::{DispatchOutcome, FanOutExecutor};
use crate::router::QueryRouter;
use crate::stores::CartStore;
use crate::synthesizer::ResponseSynthesizer;

const ALL_AGENTS_FAILED_MESSAGE: &str = "Hệ thống đang gặp sự cố. Vui lòng thử lại sau ít phút.";
const NO_INFORMATION_MESSAGE: &str = "Xin lỗi, tôi không tìm thấy thông tin phù hợp với câu hỏi của bạn. Vui lòng thử lại với câu hỏi khác hoặc liên hệ với chúng tôi để được hỗ trợ.";
const CART_ADDED_MESSAGE: &str = "Đã thêm sản phẩm vào giỏ hàng thành công!";
const CART_FAILED_MESSAGE: &str =
    "Không thể thêm sản phẩm vào giỏ hàng. Vui lòng thử lại sau.";
const CART_CANCELLED_MESSAGE: &str =
    "Đã hủy thao tác thêm vào giỏ hàng. Bạn cần hỗ trợ gì thêm không?";

pub struct ChatOrchestrator {
    router: QueryRouter,
    executor: FanOutExecutor,
    synthesizer: ResponseSynthesizer,
    conversations: Arc<ConversationTracker>,
    cart: Arc<dyn CartStore>,
}

impl ChatOrchestrator {
    pub fn new(
        router: QueryRouter,
        executor: FanOutExecutor,
        synthesizer: ResponseSynthesizer,
        conversations: Arc<ConversationTracker>,
        cart: Arc<dyn CartStore>,
    ) -> Self {
        Self {
            router,
            executor,
            synthesizer,
            conversations,
            cart,
        }
    }

    pub async fn process(&self, query: ChatQuery) -> ChatAnswer {
        // A pending confirmation short-circuits the whole pipeline: the
        // identity's next message settles it, whatever it says.
        if let Some(identity) = &query.identity {
            if let Some(pending) = self.conversations.take(identity.customer_id).await {
                return self.settle_pending(identity, pending, &query.question).await;
            }
        }

        let decision = self.router.classify(&query.question).await;
        info!(
            "query analysis: {} agent(s) selected ({})",
            decision.selected_count(),
            decision.reasoning
        );

        let answer = match self.executor.dispatch(&query, &decision).await {
            DispatchOutcome::NoAgents => ChatAnswer::text(NO_INFORMATION_MESSAGE),
            DispatchOutcome::AllFailed => ChatAnswer::text(ALL_AGENTS_FAILED_MESSAGE),
            DispatchOutcome::Results(results) => {
                self.synthesizer.synthesize(&query.question, &results).await
            }
        };

        // An offer returned to an authenticated caller opens the pending
        // confirmation window for their next message.
        if let (ChatAnswer::Offer(offer), Some(identity)) = (&answer, &query.identity) {
            if offer.awaiting_confirmation {
                self.conversations
                    .set_pending(
                        identity.customer_id,
                        PendingAction::AwaitCartConfirmation {
                            product_id: offer.product_id,
                            product_name: offer.product_name.clone(),
                            quantity: 1,
                        },
                    )
                    .await;
            }
        }

        answer
    }

    async fn settle_pending(
        &self,
        identity: &Identity,
        pending: PendingAction,
        reply: &str,
    ) -> ChatAnswer {
        let PendingAction::AwaitCartConfirmation {
            product_id,
            product_name,
            quantity,
        } = pending;

        if !ConversationTracker::is_affirmative(reply) {
            return ChatAnswer::text(CART_CANCELLED_MESSAGE);
        }

        info!(
            "adding product {} to cart for customer {} (quantity {})",
            product_id, identity.customer_id, quantity
        );
        match self
            .cart
            .add_item(identity.customer_id, product_id, quantity)
            .await
        {
            Ok(()) => ChatAnswer::text(format!("{} ({})", CART_ADDED_MESSAGE, product_name)),
            Err(err) => {
                error!("cart add failed: {}", err);
                ChatAnswer::text(CART_FAILED_MESSAGE)
            }
        }
    }
}
