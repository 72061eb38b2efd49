use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use zaplap_chat::agents::{
    GraphQueryAgent, KnowledgeBaseAgent, OrderHistoryAgent, ProductCatalogAgent, PromotionAgent,
    WebSearchAgent,
};
use zaplap_chat::cache::SemanticCache;
use zaplap_chat::cli::Cli;
use zaplap_chat::config::Settings;
use zaplap_chat::conversation::ConversationTracker;
use zaplap_chat::executor::FanOutExecutor;
use zaplap_chat::gateway::{CallGateway, ThrottlePolicy};
use zaplap_chat::orchestrator::ChatOrchestrator;
use zaplap_chat::providers::{AnthropicProvider, OpenAiEmbeddingProvider};
use zaplap_chat::router::QueryRouter;
use zaplap_chat::stores::{Neo4jHttpStore, PostgresStores, QdrantIndex, TavilyClient};
use zaplap_chat::synthesizer::ResponseSynthesizer;
use zaplap_chat::{create_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut settings = Settings::new(cli.config.as_deref())?;
    if let Some(host) = cli.host {
        settings.server.host = host;
    }
    if let Some(port) = cli.port {
        settings.server.port = port;
    }

    info!(
        "Starting Zaplap chat service on {}:{}",
        settings.server.host, settings.server.port
    );

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect_lazy(&settings.database.url)?;
    let stores = Arc::new(PostgresStores::new(pool));

    let inference = Arc::new(AnthropicProvider::new(&settings.inference.base_url)?);
    let embedding = Arc::new(OpenAiEmbeddingProvider::new(
        &settings.embedding.base_url,
        &settings.embedding.model,
    )?);
    let gateway = Arc::new(CallGateway::new(
        inference,
        embedding,
        ThrottlePolicy {
            min_spacing: Duration::from_millis(settings.inference.min_spacing_ms),
            max_retries: settings.inference.max_retries,
            initial_backoff: Duration::from_millis(settings.inference.initial_backoff_ms),
        },
        ThrottlePolicy {
            min_spacing: Duration::from_millis(settings.embedding.min_spacing_ms),
            max_retries: settings.embedding.max_retries,
            initial_backoff: Duration::from_millis(settings.embedding.initial_backoff_ms),
        },
    ));

    let cache = Arc::new(SemanticCache::new(
        Duration::from_secs(settings.cache.ttl_secs),
        settings.cache.capacity,
    ));
    let graph_store = Arc::new(Neo4jHttpStore::new(
        settings.graph.url.clone(),
        settings.graph.database.clone(),
        settings.graph.user.clone(),
        settings.graph.password.clone(),
    ));
    let vector_index = Arc::new(QdrantIndex::new(
        settings.vector.url.clone(),
        settings.vector.collection.clone(),
        settings.vector.api_key.clone(),
    ));
    let web_search = Arc::new(TavilyClient::new(settings.web_search.base_url.clone())?);

    let executor = FanOutExecutor::new(
        Arc::new(OrderHistoryAgent::new(stores.clone())),
        Arc::new(PromotionAgent::new(stores.clone())),
        Arc::new(ProductCatalogAgent::new(stores.clone())),
        Arc::new(GraphQueryAgent::new(
            gateway.clone(),
            graph_store,
            settings.inference.model_id.clone(),
        )),
        Arc::new(WebSearchAgent::new(web_search)),
        Arc::new(KnowledgeBaseAgent::new(
            gateway.clone(),
            cache.clone(),
            vector_index,
        )),
    );
    let router = QueryRouter::new(gateway.clone(), settings.inference.fallback_model_id.clone());
    let synthesizer =
        ResponseSynthesizer::new(gateway, settings.inference.fallback_model_id.clone());
    let orchestrator = Arc::new(ChatOrchestrator::new(
        router,
        executor,
        synthesizer,
        Arc::new(ConversationTracker::new()),
        stores,
    ));

    let state = AppState {
        orchestrator,
        jwt_secret: settings.auth.jwt_secret.clone(),
    };
    let app = create_app(state, settings.rate_limit.as_ref());

    let addr: SocketAddr =
        format!("{}:{}", settings.server.host, settings.server.port).parse()?;
    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
