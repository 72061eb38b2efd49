//! Chat endpoint handler

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use super::auth;
use crate::domain::{ChatAnswer, ChatQuery};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: ChatAnswer,
}

/// `POST /api/chat`: answers one question, optionally authenticated.
pub async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let request_id = Uuid::new_v4();
    info!(%request_id, question = %request.question, "processing chat query");

    let identity = auth::identity_from_headers(&headers, &state.jwt_secret);
    let query = ChatQuery::new(request.question, identity);
    let answer = state.orchestrator.process(query).await;

    Json(ChatResponse { answer })
}

/// `GET /health`: liveness probe.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "zaplap-chat" }))
}
