//! Analytics reads and the AI locality summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use tracing::warn;

use crate::analytics::prompts::LOCALITY_SUMMARY_PROMPT;
use crate::analytics::rollup::{build_report, AnalyticsReport, ComplaintFacts, ResolutionPair};
use crate::errors::AppError;
use crate::llm_client::GenerationConfig;
use crate::models::complaint::ComplaintStatus;
use crate::state::AppState;

/// How many recent unresolved complaints feed the locality summary prompt.
const SUMMARY_SAMPLE_SIZE: i64 = 20;

pub async fn get_analytics(pool: &PgPool) -> Result<AnalyticsReport, AppError> {
    let facts: Vec<ComplaintFacts> =
        sqlx::query_as("SELECT category, location, status, severity FROM complaints")
            .fetch_all(pool)
            .await?;

    let resolutions: Vec<ResolutionPair> = sqlx::query_as(
        "SELECT c.created_at, r.resolved_at
         FROM resolution_logs r
         JOIN complaints c ON c.id = r.complaint_id",
    )
    .fetch_all(pool)
    .await?;

    Ok(build_report(&facts, &resolutions))
}

#[derive(Debug, Clone, FromRow)]
struct ComplaintDigest {
    title: String,
    description: String,
    category: String,
    location: String,
    severity: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalitySummary {
    pub summary: String,
    #[serde(default)]
    pub top_issues: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct LocalitySummaryResponse {
    #[serde(flatten)]
    pub report: LocalitySummary,
    pub generated_at: DateTime<Utc>,
}

/// Generates the AI locality narrative from the most recent unresolved
/// complaints. Model failure is never surfaced — admins get a fixed
/// "unable to generate" payload instead of an error.
pub async fn get_locality_summary(state: &AppState) -> Result<LocalitySummaryResponse, AppError> {
    let digests: Vec<ComplaintDigest> = sqlx::query_as(
        "SELECT title, description, category, location, severity FROM complaints
         WHERE status <> $1
         ORDER BY created_at DESC
         LIMIT $2",
    )
    .bind(ComplaintStatus::Resolved.as_str())
    .bind(SUMMARY_SAMPLE_SIZE)
    .fetch_all(&state.db)
    .await?;

    let report = if digests.is_empty() {
        LocalitySummary {
            summary: "No complaints found in the system yet.".to_string(),
            top_issues: vec![],
            recommendations: vec!["Encourage citizens to report civic issues.".to_string()],
        }
    } else {
        let listing: Vec<String> = digests.iter().map(format_digest_line).collect();
        let prompt = LOCALITY_SUMMARY_PROMPT.replace("{complaints}", &listing.join("\n"));

        match state
            .llm
            .generate_json::<LocalitySummary>(
                &prompt,
                GenerationConfig {
                    temperature: 0.3,
                    max_output_tokens: 1024,
                },
            )
            .await
        {
            Ok(s) => s,
            Err(e) => {
                warn!("locality summary generation failed: {e}");
                LocalitySummary {
                    summary: "Unable to generate summary at this time.".to_string(),
                    top_issues: vec![],
                    recommendations: vec![],
                }
            }
        }
    };

    Ok(LocalitySummaryResponse {
        report,
        generated_at: Utc::now(),
    })
}

fn format_digest_line(d: &ComplaintDigest) -> String {
    format!(
        "- [{}] {}: {} (Severity: {}, Location: {})",
        d.category, d.title, d.description, d.severity, d.location
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_line_format() {
        let d = ComplaintDigest {
            title: "Overflowing bins".to_string(),
            description: "Bins on the pier have not been emptied in two weeks.".to_string(),
            category: "Sanitation".to_string(),
            location: "Harbor, Pier 3".to_string(),
            severity: "Medium".to_string(),
        };
        assert_eq!(
            format_digest_line(&d),
            "- [Sanitation] Overflowing bins: Bins on the pier have not been emptied in two weeks. \
             (Severity: Medium, Location: Harbor, Pier 3)"
        );
    }
}
