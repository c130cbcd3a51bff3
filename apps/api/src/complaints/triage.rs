//! Text classification and the fallback triage policy.
//!
//! The classifier is pluggable behind a trait so the intake pipeline can be
//! exercised without a live model. The policy when classification succeeds:
//! the model's category/severity win over the citizen's self-report, but only
//! after coercion against the closed enumerations — an unrecognized model
//! value falls back to the user-declared one.

use async_trait::async_trait;
use serde::Deserialize;

use crate::complaints::handlers::ComplaintCreate;
use crate::complaints::prompts::CLASSIFY_PROMPT;
use crate::llm_client::{GeminiClient, GenerationConfig, LlmError};
use crate::models::complaint::{ComplaintCategory, Severity};

/// Maximum summary length when the classifier is unavailable and the
/// description itself has to stand in.
const FALLBACK_SUMMARY_CHARS: usize = 200;

/// Structured output of the classification model. Category and severity are
/// raw strings here — coercion happens in [`resolve_triage`].
#[derive(Debug, Clone, Deserialize)]
pub struct Classification {
    pub category: String,
    pub severity: String,
    pub summary: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Carried in `AppState` as `Arc<dyn Classifier>`. Failure here must carry a
/// clear signal — the intake pipeline applies its own fallback.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, title: &str, description: &str)
        -> Result<Classification, LlmError>;
}

/// Gemini-backed classifier.
pub struct GeminiClassifier(pub GeminiClient);

#[async_trait]
impl Classifier for GeminiClassifier {
    async fn classify(
        &self,
        title: &str,
        description: &str,
    ) -> Result<Classification, LlmError> {
        let prompt = CLASSIFY_PROMPT
            .replace("{title}", title)
            .replace("{description}", description);
        self.0
            .generate_json(
                &prompt,
                GenerationConfig {
                    temperature: 0.1,
                    max_output_tokens: 512,
                },
            )
            .await
    }
}

/// The effective triage fields persisted on the complaint.
#[derive(Debug, Clone, PartialEq)]
pub struct Triage {
    pub category: &'static str,
    pub severity: &'static str,
    pub summary: String,
    pub keywords: Vec<String>,
}

/// Merges the user submission with an optional classification result.
///
/// With no classification (model unreachable, timed out, or malformed), the
/// user-declared category/severity are kept, the summary is the first 200
/// characters of the description, and keywords are empty — submission never
/// blocks on model availability.
pub fn resolve_triage(input: &ComplaintCreate, ai: Option<Classification>) -> Triage {
    match ai {
        Some(c) => Triage {
            category: ComplaintCategory::parse(&c.category)
                .unwrap_or(input.category)
                .as_str(),
            severity: Severity::parse(&c.severity)
                .unwrap_or(input.severity)
                .as_str(),
            summary: c.summary,
            keywords: c.keywords,
        },
        None => Triage {
            category: input.category.as_str(),
            severity: input.severity.as_str(),
            summary: input
                .description
                .chars()
                .take(FALLBACK_SUMMARY_CHARS)
                .collect(),
            keywords: Vec::new(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> ComplaintCreate {
        ComplaintCreate {
            title: "Streetlight out on Oak Avenue".to_string(),
            description: "The streetlight near the school crossing has been dark for a week."
                .to_string(),
            category: ComplaintCategory::Electricity,
            severity: Severity::Medium,
            location: "Oak Avenue, Riverside".to_string(),
            image_url: None,
        }
    }

    #[test]
    fn test_fallback_uses_user_declared_values() {
        let t = resolve_triage(&input(), None);
        assert_eq!(t.category, "Electricity");
        assert_eq!(t.severity, "Medium");
        assert!(t.keywords.is_empty());
        assert_eq!(
            t.summary,
            "The streetlight near the school crossing has been dark for a week."
        );
    }

    #[test]
    fn test_fallback_summary_truncates_to_200_chars() {
        let mut i = input();
        i.description = "x".repeat(300);
        let t = resolve_triage(&i, None);
        assert_eq!(t.summary.chars().count(), 200);
    }

    #[test]
    fn test_classification_overrides_user_values() {
        let t = resolve_triage(
            &input(),
            Some(Classification {
                category: "Public Safety".to_string(),
                severity: "High".to_string(),
                summary: "Dark school crossing.".to_string(),
                keywords: vec!["streetlight".to_string()],
            }),
        );
        assert_eq!(t.category, "Public Safety");
        assert_eq!(t.severity, "High");
        assert_eq!(t.summary, "Dark school crossing.");
        assert_eq!(t.keywords, vec!["streetlight".to_string()]);
    }

    #[test]
    fn test_unrecognized_model_category_falls_back_to_user() {
        let t = resolve_triage(
            &input(),
            Some(Classification {
                category: "Street Lighting".to_string(),
                severity: "Critical".to_string(),
                summary: "s".to_string(),
                keywords: vec![],
            }),
        );
        // Both values failed coercion against the closed enums.
        assert_eq!(t.category, "Electricity");
        assert_eq!(t.severity, "Medium");
    }

    #[test]
    fn test_model_values_are_trimmed_before_coercion() {
        let t = resolve_triage(
            &input(),
            Some(Classification {
                category: " Sanitation ".to_string(),
                severity: "Low ".to_string(),
                summary: "s".to_string(),
                keywords: vec![],
            }),
        );
        assert_eq!(t.category, "Sanitation");
        assert_eq!(t.severity, "Low");
    }
}
