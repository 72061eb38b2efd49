//! Graph-query agent: natural language to Cypher, executed on the graph store

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::{contains_any, RetrievalAgent};
use crate::domain::{format_vnd, AgentName, AgentPayload, ChatQuery};
use crate::error::AgentError;
use crate::gateway::CallGateway;
use crate::providers::{ChatMessage, InferenceRequest};
use crate::stores::GraphStore;
use tracing::info;

const GRAPH_KEYWORDS: &[&str] = &[
    "so sánh",
    "laptop nào",
    "triệu",
    "giá dưới",
    "giá trên",
    "lọc",
];

const CYPHER_SYSTEM_PROMPT: &str = r#"You are a Cypher query generator for an e-commerce Neo4j database.

Graph schema:
(:Customer)-[:ADDED_TO_CART]->(:Product)
(:Customer)-[:PLACED]->(:Order)
(:Order)-[:CONTAINS]->(:Product)
(:Product)-[:RECOMMENDS]->(:Product)
(:Product)-[:HAS_SPEC]->(:LaptopSpec)
(:Product)-[:BELONGS_TO]->(:Category)

Node properties:
Product: id, name, brand, price
LaptopSpec: processor_name, ram, ssd, hdd, display_inches
Category: name

Guidelines:
- Translate intent like "laptop văn phòng HP" into brand = "HP" AND Category.name = "Văn phòng"
- Translate price phrases:
    - "khoảng 15 triệu" → price <= 15000000 AND price >= 13000000
    - "dưới 10 triệu" → price < 10000000
    - "trên 20 triệu" → price > 20000000
- Only return Cypher query
- Limit to 5 results unless specified

Examples:
Q: Tôi muốn mua laptop gaming dưới 20 triệu
A:
MATCH (p:Product)-[:BELONGS_TO]->(c:Category)
WHERE c.name = "Gaming" AND p.price < 20000000
RETURN p LIMIT 5

Q: Cho tôi vài máy văn phòng HP giá khoảng 15 triệu
A:
MATCH (p:Product)-[:BELONGS_TO]->(c:Category)
WHERE c.name = "Văn phòng" AND p.brand = "HP" AND p.price >= 13000000 AND p.price <= 17000000
RETURN p LIMIT 5"#;

pub struct GraphQueryAgent {
    gateway: Arc<CallGateway>,
    graph: Arc<dyn GraphStore>,
    model_id: String,
}

impl GraphQueryAgent {
    pub fn new(gateway: Arc<CallGateway>, graph: Arc<dyn GraphStore>, model_id: String) -> Self {
        Self {
            gateway,
            graph,
            model_id,
        }
    }

    async fn generate_cypher(&self, question: &str) -> Option<String> {
        let request = InferenceRequest {
            model_id: self.model_id.clone(),
            system: CYPHER_SYSTEM_PROMPT.to_string(),
            messages: vec![ChatMessage::user(question)],
            max_tokens: 500,
            temperature: 0.0,
        };
        match self.gateway.invoke_model(&request).await {
            Ok(text) => {
                let cypher = text.trim().to_string();
                if cypher.is_empty() {
                    None
                } else {
                    Some(cypher)
                }
            }
            Err(err) => {
                tracing::error!("cypher generation failed: {}", err);
                None
            }
        }
    }

    fn format_results(rows: &[Value]) -> String {
        if rows.is_empty() {
            return "Không tìm thấy kết quả phù hợp.".to_string();
        }

        rows.iter()
            .map(|row| {
                let Some(node) = row.as_object() else {
                    return row.to_string();
                };
                let display = field_f64(node, "display_inches")
                    .map(|inches| inches.to_string())
                    .unwrap_or_else(|| "Không rõ".to_string());
                let price = field_f64(node, "price")
                    .map(format_vnd)
                    .unwrap_or_else(|| "Không rõ".to_string());
                format!(
                    "• {}\n  • Thương hiệu: {}\n  • CPU: {}\n  • RAM: {}\n  • SSD: {}\n  • HDD: {}\n  • Màn hình: {} inch\n  • Giá: {}\n  • ID: {}",
                    field_str(node, "name").unwrap_or_else(|| "Không có".to_string()),
                    field_str(node, "brand").unwrap_or_else(|| "Không có".to_string()),
                    field_str(node, "processor_name").unwrap_or_else(|| "Không có".to_string()),
                    field_str(node, "ram").unwrap_or_else(|| "Không có".to_string()),
                    field_str(node, "ssd").unwrap_or_else(|| "Không có".to_string()),
                    field_str(node, "hdd").unwrap_or_else(|| "Không có".to_string()),
                    display,
                    price,
                    field_str(node, "id").unwrap_or_else(|| "Không có".to_string()),
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// String form of a property that may arrive as a string or a number.
fn field_str(node: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    match node.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Numeric form of a property that may arrive as a number or numeric string.
fn field_f64(node: &serde_json::Map<String, Value>, key: &str) -> Option<f64> {
    match node.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[async_trait]
impl RetrievalAgent for GraphQueryAgent {
    fn name(&self) -> AgentName {
        AgentName::Graph
    }

    fn is_relevant(&self, question: &str) -> bool {
        contains_any(question, GRAPH_KEYWORDS)
    }

    fn unavailable_message(&self) -> &'static str {
        "Không thể truy vấn cơ sở dữ liệu đồ thị."
    }

    async fn get_context(&self, query: &ChatQuery) -> Result<AgentPayload, AgentError> {
        // An empty or failed generation never reaches the graph store.
        let Some(cypher) = self.generate_cypher(&query.question).await else {
            return Ok(AgentPayload::text("Không thể sinh truy vấn từ câu hỏi."));
        };

        info!("executing graph query: {}", cypher);
        match self.graph.run(&cypher).await {
            Ok(rows) => Ok(AgentPayload::text(Self::format_results(&rows))),
            Err(err) => {
                tracing::error!("cypher execution failed: {}", err);
                Ok(AgentPayload::text("Không thể thực thi truy vấn Cypher."))
            }
        }
    }
}
