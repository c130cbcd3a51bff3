use async_trait::async_trait;

use crate::llm_client::{GeminiClient, LlmError};

/// Embedding provider seam. Carried in `AppState` as `Arc<dyn Embedder>`.
/// Failure is always non-fatal to the submission flow — callers degrade to
/// "no duplicate found".
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f64>, LlmError>;
}

pub struct GeminiEmbedder(pub GeminiClient);

#[async_trait]
impl Embedder for GeminiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f64>, LlmError> {
        self.0.embed(text).await
    }
}
