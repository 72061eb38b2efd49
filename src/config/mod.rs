//! Layered configuration
//!
//! `Settings::new` reads an optional `zaplap.toml` and overlays
//! `ZAPLAP_`-prefixed environment variables (`ZAPLAP_SERVER__PORT=8080`).
//! Secrets (provider API keys) are never part of the settings file; providers
//! read them from their own environment variables at construction.

use config::{Config, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub inference: InferenceSettings,
    #[serde(default)]
    pub embedding: EmbeddingSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub graph: GraphSettings,
    #[serde(default)]
    pub vector: VectorSettings,
    #[serde(default)]
    pub web_search: WebSearchSettings,
    #[serde(default)]
    pub rate_limit: Option<RateLimitSettings>,
}

impl Settings {
    pub fn new(config_path: Option<&str>) -> Result<Self, config::ConfigError> {
        Config::builder()
            .add_source(File::with_name(config_path.unwrap_or("zaplap")).required(false))
            .add_source(Environment::with_prefix("ZAPLAP").separator("__"))
            .build()?
            .try_deserialize()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct InferenceSettings {
    #[serde(default = "default_inference_base_url")]
    pub base_url: String,
    /// Primary model, reserved for structured query generation.
    #[serde(default = "default_model_id")]
    pub model_id: String,
    /// Cheaper model used for classification and synthesis.
    #[serde(default = "default_fallback_model_id")]
    pub fallback_model_id: String,
    #[serde(default = "default_inference_spacing_ms")]
    pub min_spacing_ms: u64,
    #[serde(default = "default_inference_retries")]
    pub max_retries: u32,
    #[serde(default = "default_inference_backoff_ms")]
    pub initial_backoff_ms: u64,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            base_url: default_inference_base_url(),
            model_id: default_model_id(),
            fallback_model_id: default_fallback_model_id(),
            min_spacing_ms: default_inference_spacing_ms(),
            max_retries: default_inference_retries(),
            initial_backoff_ms: default_inference_backoff_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingSettings {
    #[serde(default = "default_embedding_base_url")]
    pub base_url: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_embedding_spacing_ms")]
    pub min_spacing_ms: u64,
    #[serde(default = "default_embedding_retries")]
    pub max_retries: u32,
    #[serde(default = "default_embedding_backoff_ms")]
    pub initial_backoff_ms: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            base_url: default_embedding_base_url(),
            model: default_embedding_model(),
            min_spacing_ms: default_embedding_spacing_ms(),
            max_retries: default_embedding_retries(),
            initial_backoff_ms: default_embedding_backoff_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl_secs(),
            capacity: default_cache_capacity(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphSettings {
    #[serde(default = "default_graph_url")]
    pub url: String,
    #[serde(default = "default_graph_database")]
    pub database: String,
    #[serde(default = "default_graph_user")]
    pub user: String,
    #[serde(default)]
    pub password: String,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            url: default_graph_url(),
            database: default_graph_database(),
            user: default_graph_user(),
            password: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VectorSettings {
    #[serde(default = "default_vector_url")]
    pub url: String,
    #[serde(default = "default_vector_collection")]
    pub collection: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for VectorSettings {
    fn default() -> Self {
        Self {
            url: default_vector_url(),
            collection: default_vector_collection(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebSearchSettings {
    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
    #[serde(default = "default_burst_size")]
    pub burst_size: u32,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_jwt_secret() -> String {
    "change-me".to_string()
}

fn default_inference_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_model_id() -> String {
    "claude-3-sonnet-20240229".to_string()
}

fn default_fallback_model_id() -> String {
    "claude-3-haiku-20240307".to_string()
}

fn default_inference_spacing_ms() -> u64 {
    1500
}

fn default_inference_retries() -> u32 {
    4
}

fn default_inference_backoff_ms() -> u64 {
    1000
}

fn default_embedding_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_embedding_spacing_ms() -> u64 {
    2000
}

fn default_embedding_retries() -> u32 {
    3
}

fn default_embedding_backoff_ms() -> u64 {
    2000
}

fn default_cache_ttl_secs() -> u64 {
    1800
}

fn default_cache_capacity() -> usize {
    100
}

fn default_database_url() -> String {
    "postgres://localhost/zaplap".to_string()
}

fn default_graph_url() -> String {
    "http://localhost:7474".to_string()
}

fn default_graph_database() -> String {
    "neo4j".to_string()
}

fn default_graph_user() -> String {
    "neo4j".to_string()
}

fn default_vector_url() -> String {
    "http://localhost:6333".to_string()
}

fn default_vector_collection() -> String {
    "laptop".to_string()
}

fn default_requests_per_second() -> u32 {
    10
}

fn default_burst_size() -> u32 {
    20
}
