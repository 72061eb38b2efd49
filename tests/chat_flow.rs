//! End-to-end flows over in-memory collaborators

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use chrono::Utc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tower::util::ServiceExt;

use zaplap_chat::agents::{
    GraphQueryAgent, KnowledgeBaseAgent, OrderHistoryAgent, ProductCatalogAgent, PromotionAgent,
    WebSearchAgent,
};
use zaplap_chat::cache::SemanticCache;
use zaplap_chat::conversation::ConversationTracker;
use zaplap_chat::domain::{ChatAnswer, ChatQuery, Identity};
use zaplap_chat::error::{AgentError, ProviderResult};
use zaplap_chat::executor::FanOutExecutor;
use zaplap_chat::gateway::{CallGateway, ThrottlePolicy};
use zaplap_chat::orchestrator::ChatOrchestrator;
use zaplap_chat::providers::{EmbeddingProvider, InferenceProvider, InferenceRequest};
use zaplap_chat::router::QueryRouter;
use zaplap_chat::stores::{
    CartStore, CatalogStore, GraphStore, OrderRow, OrderStore, ProductRow, PromotionRow,
    PromotionStore, ScoredPoint, SearchHit, SearchOutcome, VectorIndex, WebSearchProvider,
};
use zaplap_chat::synthesizer::ResponseSynthesizer;
use zaplap_chat::{create_app, AppState};

const JWT_SECRET: &str = "test-secret";

/// Scripted inference: classification calls get a canned routing JSON, every
/// other call (synthesis, query generation) echoes its user content so
/// assertions can see exactly what context reached the model.
struct ScriptedInference {
    routing_json: String,
}

#[async_trait]
impl InferenceProvider for ScriptedInference {
    async fn invoke(&self, request: &InferenceRequest) -> ProviderResult<String> {
        if request.system.starts_with("Bạn là trợ lý phân tích câu hỏi") {
            Ok(self.routing_json.clone())
        } else {
            Ok(request.messages[0].content.clone())
        }
    }
}

struct FixedEmbedding;

#[async_trait]
impl EmbeddingProvider for FixedEmbedding {
    async fn embed(&self, _text: &str) -> ProviderResult<Vec<f32>> {
        Ok(vec![0.1, 0.2, 0.3])
    }
}

struct RecordingOrders {
    rows: Vec<OrderRow>,
    queried_ids: Mutex<Vec<i64>>,
}

#[async_trait]
impl OrderStore for RecordingOrders {
    async fn list_recent(
        &self,
        customer_id: i64,
        _limit: i64,
    ) -> Result<Vec<OrderRow>, AgentError> {
        self.queried_ids.lock().await.push(customer_id);
        Ok(self.rows.clone())
    }
}

struct EmptyPromotions;

#[async_trait]
impl PromotionStore for EmptyPromotions {
    async fn list_active(&self) -> Result<Vec<PromotionRow>, AgentError> {
        Ok(vec![])
    }
}

struct FixedCatalog(Vec<ProductRow>);

#[async_trait]
impl CatalogStore for FixedCatalog {
    async fn search(&self, _text: &str, _limit: i64) -> Result<Vec<ProductRow>, AgentError> {
        Ok(self.0.clone())
    }
}

struct RecordingCart {
    adds: AtomicU32,
    last_product: Mutex<Option<i64>>,
}

#[async_trait]
impl CartStore for RecordingCart {
    async fn add_item(
        &self,
        _customer_id: i64,
        product_id: i64,
        _quantity: i32,
    ) -> Result<(), AgentError> {
        self.adds.fetch_add(1, Ordering::SeqCst);
        *self.last_product.lock().await = Some(product_id);
        Ok(())
    }
}

struct EmptyGraph;

#[async_trait]
impl GraphStore for EmptyGraph {
    async fn run(&self, _cypher: &str) -> Result<Vec<serde_json::Value>, AgentError> {
        Ok(vec![])
    }
}

struct FixedVectors(Vec<ScoredPoint>);

#[async_trait]
impl VectorIndex for FixedVectors {
    async fn nearest_neighbors(
        &self,
        _vector: &[f32],
        _k: u64,
    ) -> Result<Vec<ScoredPoint>, AgentError> {
        Ok(self.0.clone())
    }
}

struct FixedWebSearch(SearchOutcome);

#[async_trait]
impl WebSearchProvider for FixedWebSearch {
    async fn search(&self, _query: &str) -> Result<SearchOutcome, AgentError> {
        Ok(self.0.clone())
    }
}

struct Harness {
    orchestrator: Arc<ChatOrchestrator>,
    orders: Arc<RecordingOrders>,
    cart: Arc<RecordingCart>,
}

fn harness(routing_json: &str, orders: Vec<OrderRow>, products: Vec<ProductRow>) -> Harness {
    let policy = ThrottlePolicy {
        min_spacing: Duration::ZERO,
        max_retries: 0,
        initial_backoff: Duration::ZERO,
    };
    let gateway = Arc::new(CallGateway::new(
        Arc::new(ScriptedInference {
            routing_json: routing_json.to_string(),
        }),
        Arc::new(FixedEmbedding),
        policy.clone(),
        policy,
    ));

    let order_store = Arc::new(RecordingOrders {
        rows: orders,
        queried_ids: Mutex::new(vec![]),
    });
    let cart = Arc::new(RecordingCart {
        adds: AtomicU32::new(0),
        last_product: Mutex::new(None),
    });
    let cache = Arc::new(SemanticCache::new(Duration::from_secs(1800), 100));

    let executor = FanOutExecutor::new(
        Arc::new(OrderHistoryAgent::new(order_store.clone())),
        Arc::new(PromotionAgent::new(Arc::new(EmptyPromotions))),
        Arc::new(ProductCatalogAgent::new(Arc::new(FixedCatalog(products)))),
        Arc::new(GraphQueryAgent::new(
            gateway.clone(),
            Arc::new(EmptyGraph),
            "claude-3-sonnet-20240229".to_string(),
        )),
        Arc::new(WebSearchAgent::new(Arc::new(FixedWebSearch(SearchOutcome {
            answer: Some("SSD là ổ cứng thể rắn.".to_string()),
            results: vec![SearchHit {
                title: "SSD".to_string(),
                content: "Ổ cứng thể rắn".to_string(),
                url: "https://example.com/ssd".to_string(),
            }],
        })))),
        Arc::new(KnowledgeBaseAgent::new(
            gateway.clone(),
            cache,
            Arc::new(FixedVectors(vec![ScoredPoint {
                score: 0.9,
                text: "Tài liệu về SSD của cửa hàng.".to_string(),
            }])),
        )),
    );

    let router = QueryRouter::new(gateway.clone(), "claude-3-haiku-20240307".to_string());
    let synthesizer = ResponseSynthesizer::new(gateway, "claude-3-haiku-20240307".to_string());
    let orchestrator = Arc::new(ChatOrchestrator::new(
        router,
        executor,
        synthesizer,
        Arc::new(ConversationTracker::new()),
        cart.clone(),
    ));

    Harness {
        orchestrator,
        orders: order_store,
        cart,
    }
}

fn identity(customer_id: i64) -> Identity {
    Identity {
        customer_id,
        role: "customer".to_string(),
    }
}

fn dell_xps() -> ProductRow {
    ProductRow {
        id: 12,
        name: "Dell XPS 13".to_string(),
        brand: Some("Dell".to_string()),
        price: 25_000_000.0,
        processor_name: Some("Intel Core i7".to_string()),
        processor_brand: Some("Intel".to_string()),
        ram: Some("16GB".to_string()),
        ssd: Some("512GB".to_string()),
        hdd: None,
        display_type: Some("IPS".to_string()),
        display_inches: Some(13.4),
    }
}

#[tokio::test]
async fn order_question_reaches_the_callers_order() {
    let harness = harness(
        r#"{"needsOrderInfo": true, "reasoning": "đơn hàng cá nhân"}"#,
        vec![OrderRow {
            id: 7001,
            total_amount: 15_000_000.0,
            order_status: "delivered".to_string(),
            payment_status: "paid".to_string(),
            created_at: Utc::now(),
        }],
        vec![],
    );

    let answer = harness
        .orchestrator
        .process(ChatQuery::new(
            "đơn hàng của tôi đã giao chưa",
            Some(identity(42)),
        ))
        .await;

    let ChatAnswer::Text(text) = answer else {
        panic!("expected text answer");
    };
    assert!(text.contains("7001"), "answer should cite the order id: {text}");
    assert_eq!(*harness.orders.queried_ids.lock().await, vec![42]);
}

#[tokio::test]
async fn general_knowledge_question_never_touches_order_history() {
    let harness = harness(
        r#"{"needsInternetSearch": true, "needsVectorSearch": true, "reasoning": "kiến thức chung"}"#,
        vec![OrderRow {
            id: 9999,
            total_amount: 1.0,
            order_status: "delivered".to_string(),
            payment_status: "paid".to_string(),
            created_at: Utc::now(),
        }],
        vec![],
    );

    let answer = harness
        .orchestrator
        .process(ChatQuery::anonymous("SSD là gì"))
        .await;

    let ChatAnswer::Text(text) = answer else {
        panic!("expected text answer");
    };
    assert!(!text.is_empty());
    assert!(!text.contains("9999"));
    assert!(harness.orders.queried_ids.lock().await.is_empty());
}

#[tokio::test]
async fn offer_then_affirmative_adds_to_cart_exactly_once() {
    let harness = harness(
        r#"{"needsProductInfo": true, "reasoning": "sản phẩm cụ thể"}"#,
        vec![],
        vec![dell_xps()],
    );

    let answer = harness
        .orchestrator
        .process(ChatQuery::new(
            "tôi muốn tham khảo laptop Dell XPS",
            Some(identity(42)),
        ))
        .await;

    let ChatAnswer::Offer(offer) = answer else {
        panic!("expected a structured offer");
    };
    assert_eq!(offer.product_id, 12);
    assert!(offer.awaiting_confirmation);

    let confirmation = harness
        .orchestrator
        .process(ChatQuery::new("có", Some(identity(42))))
        .await;

    let ChatAnswer::Text(text) = confirmation else {
        panic!("expected confirmation text");
    };
    assert!(text.contains("giỏ hàng"));
    assert_eq!(harness.cart.adds.load(Ordering::SeqCst), 1);
    assert_eq!(*harness.cart.last_product.lock().await, Some(12));

    // The pending state was consumed: another "có" goes through the normal
    // pipeline instead of adding again.
    harness
        .orchestrator
        .process(ChatQuery::new("có", Some(identity(42))))
        .await;
    assert_eq!(harness.cart.adds.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn offer_then_decline_clears_state_without_cart_calls() {
    let harness = harness(
        r#"{"needsProductInfo": true, "reasoning": "sản phẩm cụ thể"}"#,
        vec![],
        vec![dell_xps()],
    );

    harness
        .orchestrator
        .process(ChatQuery::new(
            "tôi muốn tham khảo laptop Dell XPS",
            Some(identity(42)),
        ))
        .await;

    let declined = harness
        .orchestrator
        .process(ChatQuery::new("không", Some(identity(42))))
        .await;

    let ChatAnswer::Text(text) = declined else {
        panic!("expected cancellation text");
    };
    assert!(text.contains("hủy"));
    assert_eq!(harness.cart.adds.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn anonymous_offer_opens_no_confirmation_window() {
    let harness = harness(
        r#"{"needsProductInfo": true, "reasoning": "sản phẩm cụ thể"}"#,
        vec![],
        vec![dell_xps()],
    );

    let answer = harness
        .orchestrator
        .process(ChatQuery::anonymous("tôi muốn tham khảo laptop Dell XPS"))
        .await;
    assert!(matches!(answer, ChatAnswer::Offer(_)));

    // "có" from a later authenticated session has nothing pending.
    harness
        .orchestrator
        .process(ChatQuery::new("có", Some(identity(42))))
        .await;
    assert_eq!(harness.cart.adds.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn http_chat_round_trip_with_bearer_token() {
    let harness = harness(
        r#"{"needsOrderInfo": true, "reasoning": "đơn hàng cá nhân"}"#,
        vec![OrderRow {
            id: 7001,
            total_amount: 15_000_000.0,
            order_status: "delivered".to_string(),
            payment_status: "paid".to_string(),
            created_at: Utc::now(),
        }],
        vec![],
    );
    let app = create_app(
        AppState {
            orchestrator: harness.orchestrator.clone(),
            jwt_secret: JWT_SECRET.to_string(),
        },
        None,
    );

    let claims = zaplap_chat::http::auth::Claims {
        user_id: 42,
        role: Some("customer".to_string()),
        exp: 4_102_444_800,
    };
    let token = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap();

    let request = Request::builder()
        .uri("/api/chat")
        .method("POST")
        .header("Content-Type", "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(
            serde_json::json!({ "question": "đơn hàng của tôi đã giao chưa" }).to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body_json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
    let answer = body_json["answer"].as_str().unwrap();
    assert!(answer.contains("7001"));
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let harness = harness("{}", vec![], vec![]);
    let app = create_app(
        AppState {
            orchestrator: harness.orchestrator.clone(),
            jwt_secret: JWT_SECRET.to_string(),
        },
        None,
    );

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
