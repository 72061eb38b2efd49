//! # zaplap-chat
//!
//! Conversational shopping assistant service for the Zaplap laptop store.
//! A free-text question is classified by the query router, fanned out across
//! specialized retrieval agents (orders, promotions, catalog, graph,
//! knowledge base, web search), and synthesized into one Vietnamese answer.
//! All inference and embedding traffic flows through a throttled call
//! gateway; a per-identity conversation state carries a single pending
//! add-to-cart confirmation across two requests.

pub mod agents;
pub mod cache;
pub mod cli;
pub mod config;
pub mod conversation;
pub mod domain;
pub mod error;
pub mod executor;
pub mod gateway;
pub mod http;
pub mod orchestrator;
pub mod providers;
pub mod router;
pub mod stores;
pub mod synthesizer;

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::RateLimitSettings;
use crate::orchestrator::ChatOrchestrator;

/// Shared state handed to the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ChatOrchestrator>,
    pub jwt_secret: String,
}

/// Builds the Axum application router.
pub fn create_app(state: AppState, rate_limit: Option<&RateLimitSettings>) -> Router {
    let mut api = Router::new()
        .route("/api/chat", post(http::chat::chat))
        .with_state(state);

    if let Some(settings) = rate_limit {
        if settings.enabled {
            let limiter = http::rate_limit::create_limiter(
                settings.requests_per_second,
                settings.burst_size,
            );
            api = api.layer(axum::middleware::from_fn_with_state(
                limiter,
                http::rate_limit::rate_limit_middleware,
            ));
        }
    }

    Router::new()
        .route("/health", get(http::chat::health))
        .merge(api)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}
