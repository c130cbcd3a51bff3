mod analytics;
mod auth;
mod complaints;
mod config;
mod db;
mod errors;
mod llm_client;
mod models;
mod rate_limit;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::complaints::embeddings::GeminiEmbedder;
use crate::complaints::triage::GeminiClassifier;
use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::GeminiClient;
use crate::rate_limit::InMemoryRateLimiter;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CivicIQ API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize the Gemini client and the pluggable pipeline seams
    let llm = GeminiClient::new(config.gemini_api_key.clone());
    info!(
        "LLM client initialized (generation: {}, embedding: {})",
        llm_client::GENERATION_MODEL,
        llm_client::EMBEDDING_MODEL
    );

    let classifier = Arc::new(GeminiClassifier(llm.clone()));
    let embedder = Arc::new(GeminiEmbedder(llm.clone()));

    // In-memory rate limiter: single-instance only. Swap the trait impl for
    // a shared-store limiter when running multiple replicas.
    let rate_limiter = Arc::new(InMemoryRateLimiter::new(config.rate_limit_complaints));

    let state = AppState {
        db,
        llm,
        classifier,
        embedder,
        rate_limiter,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
