use std::sync::Arc;

use sqlx::PgPool;

use crate::complaints::embeddings::Embedder;
use crate::complaints::triage::Classifier;
use crate::config::Config;
use crate::llm_client::GeminiClient;
use crate::rate_limit::RateLimiter;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Used directly for locality summaries; classification and embedding go
    /// through the pluggable seams below.
    pub llm: GeminiClient,
    pub classifier: Arc<dyn Classifier>,
    pub embedder: Arc<dyn Embedder>,
    pub rate_limiter: Arc<dyn RateLimiter>,
    pub config: Config,
}
