//! Conversation state: one pending add-to-cart confirmation per identity

use std::collections::HashMap;
use tokio::sync::Mutex;

/// Affirmative replies, matched exactly or as substrings.
const AFFIRMATIVE_REPLIES: &[&str] = &[
    "có", "co", "đúng", "dung", "ok", "oke", "okay", "yes", "đồng ý", "dong y", "chắc chắn",
    "chac chan", "muốn", "muon", "thêm", "them",
];

/// The single follow-up action this service tracks across two requests.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingAction {
    AwaitCartConfirmation {
        product_id: i64,
        product_name: String,
        quantity: i32,
    },
}

/// Per-identity pending-action store. Injected as a shared service object;
/// entries are written when an offer goes out and consumed unconditionally by
/// the identity's next message. There is no timeout: state persists until
/// superseded.
#[derive(Default)]
pub struct ConversationTracker {
    pending: Mutex<HashMap<i64, PendingAction>>,
}

impl ConversationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a pending action, replacing any prior one for the identity.
    pub async fn set_pending(&self, customer_id: i64, action: PendingAction) {
        self.pending.lock().await.insert(customer_id, action);
    }

    /// Removes and returns the identity's pending action. The caller decides
    /// between confirm and cancel; either way the state is already cleared,
    /// so no pending action survives a follow-up message.
    pub async fn take(&self, customer_id: i64) -> Option<PendingAction> {
        self.pending.lock().await.remove(&customer_id)
    }

    /// Whether a reply confirms the pending action.
    pub fn is_affirmative(reply: &str) -> bool {
        let lowered = reply.trim().to_lowercase();
        AFFIRMATIVE_REPLIES
            .iter()
            .any(|candidate| lowered == *candidate || lowered.contains(candidate))
    }
}
