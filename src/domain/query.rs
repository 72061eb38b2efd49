use serde::{Deserialize, Serialize};

/// Verified caller identity, decoded from a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub customer_id: i64,
    pub role: String,
}

/// One incoming user question. Immutable once received.
#[derive(Debug, Clone)]
pub struct ChatQuery {
    pub question: String,
    pub identity: Option<Identity>,
}

impl ChatQuery {
    pub fn new(question: impl Into<String>, identity: Option<Identity>) -> Self {
        Self {
            question: question.into(),
            identity,
        }
    }

    pub fn anonymous(question: impl Into<String>) -> Self {
        Self::new(question, None)
    }
}
