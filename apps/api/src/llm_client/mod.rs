/// LLM client — the single point of entry for all Gemini API calls in CivicIQ.
///
/// ARCHITECTURAL RULE: No other module may call the Gemini API directly.
/// All model interactions MUST go through this module.
use std::time::Duration;

use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const GEMINI_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
/// The generation model used for classification and locality summaries.
/// Intentionally hardcoded to prevent accidental drift.
pub const GENERATION_MODEL: &str = "gemini-1.5-flash";
pub const EMBEDDING_MODEL: &str = "text-embedding-004";

/// Bounded per-call timeouts so a slow model call cannot hang a request.
const GENERATE_TIMEOUT: Duration = Duration::from_secs(30);
const EMBED_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("model returned empty content")]
    EmptyContent,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct GenerationConfig {
    pub temperature: f64,
    #[serde(rename = "maxOutputTokens")]
    pub max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<TextPart>,
}

#[derive(Debug, Deserialize)]
struct TextPart {
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    content: Content<'a>,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    values: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

/// The single Gemini client shared by all services.
/// Callers decide what a failure means; this layer never swallows one.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
        }
    }

    /// Calls the generation model and returns the raw text of the first
    /// candidate.
    pub async fn generate(
        &self,
        prompt: &str,
        config: GenerationConfig,
    ) -> Result<String, LlmError> {
        let request_body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: config,
        };

        let url = format!(
            "{GEMINI_BASE}/{GENERATION_MODEL}:generateContent?key={}",
            self.api_key
        );
        let response = self
            .client
            .post(&url)
            .timeout(GENERATE_TIMEOUT)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GeminiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .and_then(|p| p.text)
            .ok_or(LlmError::EmptyContent)?;

        debug!(chars = text.len(), "generation call succeeded");
        Ok(text)
    }

    /// Convenience method that calls the generation model and deserializes
    /// the text response as JSON. The prompt must instruct the model to
    /// return valid JSON.
    pub async fn generate_json<T: DeserializeOwned>(
        &self,
        prompt: &str,
        config: GenerationConfig,
    ) -> Result<T, LlmError> {
        let text = self.generate(prompt, config).await?;
        let text = strip_json_fences(&text);
        serde_json::from_str(text).map_err(LlmError::Parse)
    }

    /// Embeds arbitrary text into a fixed-dimension semantic vector.
    pub async fn embed(&self, text: &str) -> Result<Vec<f64>, LlmError> {
        let model = format!("models/{EMBEDDING_MODEL}");
        let request_body = EmbedRequest {
            model: &model,
            content: Content {
                parts: vec![Part { text }],
            },
        };

        let url = format!(
            "{GEMINI_BASE}/{EMBEDDING_MODEL}:embedContent?key={}",
            self.api_key
        );
        let response = self
            .client
            .post(&url)
            .timeout(EMBED_TIMEOUT)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GeminiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: EmbedResponse = response.json().await?;
        if parsed.embedding.values.is_empty() {
            return Err(LlmError::EmptyContent);
        }

        debug!(
            dims = parsed.embedding.values.len(),
            "embedding call succeeded"
        );
        Ok(parsed.embedding.values)
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"severity\": \"High\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"severity\": \"High\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"severity\": \"High\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"severity\": \"High\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"severity\": \"High\"}";
        assert_eq!(strip_json_fences(input), "{\"severity\": \"High\"}");
    }

    #[test]
    fn test_strip_json_fences_unterminated_fence() {
        let input = "```json\n{\"severity\": \"High\"}";
        assert_eq!(strip_json_fences(input), "{\"severity\": \"High\"}");
    }
}
