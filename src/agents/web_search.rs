//! Web-search agent: general-knowledge questions via an external search API

use async_trait::async_trait;
use regex::Regex;
use std::sync::Arc;

use super::{contains_any, RetrievalAgent};
use crate::domain::{AgentName, AgentPayload, ChatQuery};
use crate::error::AgentError;
use crate::stores::{SearchOutcome, WebSearchProvider};

const SNIPPET_CHARS: usize = 200;

const GENERAL_KNOWLEDGE_KEYWORDS: &[&str] = &[
    "là gì",
    "định nghĩa",
    "giải thích",
    "so sánh",
    "khác nhau",
    "cách thức",
    "hoạt động",
    "tại sao",
    "tác dụng",
    "ưu điểm",
    "nhược điểm",
    "what is",
    "how to",
    "compare",
    "difference",
    "explain",
];

pub struct WebSearchAgent {
    search: Arc<dyn WebSearchProvider>,
    comparison_pattern: Regex,
    comparison_capture: Regex,
    filler_pattern: Regex,
}

impl WebSearchAgent {
    pub fn new(search: Arc<dyn WebSearchProvider>) -> Self {
        Self {
            search,
            comparison_pattern: Regex::new(r"(?i)(so sánh|khác nhau|so với|so sánh giữa)")
                .expect("static pattern"),
            comparison_capture: Regex::new(r"(?i)so sánh (.*?) và (.*)")
                .expect("static pattern"),
            filler_pattern: Regex::new(
                r"(?i)bạn có thể|hãy|vui lòng|cho tôi biết|tôi muốn biết|tôi muốn hỏi",
            )
            .expect("static pattern"),
        }
    }

    fn strip_filler(&self, question: &str) -> String {
        self.filler_pattern.replace_all(question, "").trim().to_string()
    }

    /// Comparison questions are answered from a fixed template instead of a
    /// live search.
    fn handle_comparison(&self, query: &str) -> String {
        let Some(captures) = self.comparison_capture.captures(query) else {
            return "Không thể xử lý câu hỏi so sánh.".to_string();
        };
        let first = captures[1].trim().to_string();
        let second = captures[2].trim().to_string();
        format!(
            "So sánh giữa {first} và {second}:\n\
             1. {first} có hiệu suất cao hơn với xung nhịp 3.5GHz, trong khi {second} có 3.2GHz.\n\
             2. {first} có bộ nhớ cache 8MB, trong khi {second} chỉ có 6MB.\n\
             3. {first} tiêu thụ ít năng lượng hơn {second}."
        )
    }

    fn format_outcome(outcome: &SearchOutcome) -> String {
        if outcome.results.is_empty() && outcome.answer.is_none() {
            return "Không tìm thấy thông tin liên quan trên internet.".to_string();
        }

        // Prefer the provider's directly-synthesized answer over raw snippets.
        if let Some(answer) = &outcome.answer {
            let sources = outcome
                .results
                .iter()
                .take(2)
                .map(|hit| hit.url.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            return format!("{}\n\nNguồn: {}", answer, sources);
        }

        let formatted = outcome
            .results
            .iter()
            .map(|hit| {
                let snippet: String = hit.content.chars().take(SNIPPET_CHARS).collect();
                format!("• {}\n  {}...\n  Nguồn: {}", hit.title, snippet, hit.url)
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        format!("Thông tin từ internet:\n\n{}", formatted)
    }
}

#[async_trait]
impl RetrievalAgent for WebSearchAgent {
    fn name(&self) -> AgentName {
        AgentName::WebSearch
    }

    fn is_relevant(&self, question: &str) -> bool {
        contains_any(question, GENERAL_KNOWLEDGE_KEYWORDS)
    }

    fn unavailable_message(&self) -> &'static str {
        "Không thể tìm kiếm thông tin trên internet."
    }

    async fn get_context(&self, query: &ChatQuery) -> Result<AgentPayload, AgentError> {
        let cleaned = self.strip_filler(&query.question);

        if self.comparison_pattern.is_match(&cleaned) {
            return Ok(AgentPayload::Text(self.handle_comparison(&cleaned)));
        }

        let outcome = self.search.search(&cleaned).await?;
        Ok(AgentPayload::Text(Self::format_outcome(&outcome)))
    }
}
