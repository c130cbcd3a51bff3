//! Pure read-side rollups over the complaint set.
//!
//! Everything here operates on already-fetched rows so the aggregation rules
//! can be tested without a database.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::models::complaint::{ComplaintStatus, Severity};

/// Each unresolved high-severity complaint costs this many health points.
const HEALTH_PENALTY_PER_HIGH: f64 = 5.0;
const TOP_LOCATIONS: usize = 3;

/// The slice of a complaint row the rollups need.
#[derive(Debug, Clone, FromRow)]
pub struct ComplaintFacts {
    pub category: String,
    pub location: String,
    pub status: String,
    pub severity: String,
}

/// A (created_at, resolved_at) pair from joining resolution logs back to
/// their complaints. Rows with a missing side never reach here — the join
/// drops them.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct ResolutionPair {
    pub created_at: DateTime<Utc>,
    pub resolved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LocationCount {
    pub location: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct AnalyticsReport {
    pub total_complaints: i64,
    pub pending_complaints: i64,
    pub resolved_complaints: i64,
    pub high_severity_unresolved: i64,
    pub complaints_by_category: Vec<CategoryCount>,
    pub top_3_locations: Vec<LocationCount>,
    pub avg_resolution_hours: Option<f64>,
    /// 100 − high_severity_unresolved × 5, floored at 0.
    pub civic_health_score: f64,
}

pub fn build_report(facts: &[ComplaintFacts], resolutions: &[ResolutionPair]) -> AnalyticsReport {
    let resolved_str = ComplaintStatus::Resolved.as_str();
    let pending_str = ComplaintStatus::Pending.as_str();

    let total = facts.len() as i64;
    let pending = facts.iter().filter(|f| f.status == pending_str).count() as i64;
    let resolved = facts.iter().filter(|f| f.status == resolved_str).count() as i64;
    let high_unresolved = facts
        .iter()
        .filter(|f| f.severity == Severity::High.as_str() && f.status != resolved_str)
        .count() as i64;

    let mut category_counts: HashMap<&str, i64> = HashMap::new();
    let mut location_counts: HashMap<String, i64> = HashMap::new();
    for f in facts {
        *category_counts.entry(f.category.as_str()).or_default() += 1;
        *location_counts.entry(location_key(&f.location)).or_default() += 1;
    }

    let mut complaints_by_category: Vec<CategoryCount> = category_counts
        .into_iter()
        .map(|(category, count)| CategoryCount {
            category: category.to_string(),
            count,
        })
        .collect();
    complaints_by_category.sort_by(|a, b| b.count.cmp(&a.count).then(a.category.cmp(&b.category)));

    let mut top_3_locations: Vec<LocationCount> = location_counts
        .into_iter()
        .map(|(location, count)| LocationCount { location, count })
        .collect();
    top_3_locations.sort_by(|a, b| b.count.cmp(&a.count).then(a.location.cmp(&b.location)));
    top_3_locations.truncate(TOP_LOCATIONS);

    AnalyticsReport {
        total_complaints: total,
        pending_complaints: pending,
        resolved_complaints: resolved,
        high_severity_unresolved: high_unresolved,
        complaints_by_category,
        top_3_locations,
        avg_resolution_hours: avg_resolution_hours(resolutions),
        civic_health_score: (100.0 - high_unresolved as f64 * HEALTH_PENALTY_PER_HIGH).max(0.0),
    }
}

/// Locations are bucketed by their first comma-delimited segment — the
/// city/area part of a free-text address.
fn location_key(location: &str) -> String {
    let key = location.split(',').next().unwrap_or("").trim();
    if key.is_empty() {
        "Unknown".to_string()
    } else {
        key.to_string()
    }
}

fn avg_resolution_hours(resolutions: &[ResolutionPair]) -> Option<f64> {
    if resolutions.is_empty() {
        return None;
    }
    let total_hours: f64 = resolutions
        .iter()
        .map(|p| (p.resolved_at - p.created_at).num_seconds() as f64 / 3600.0)
        .sum();
    let avg = total_hours / resolutions.len() as f64;
    Some((avg * 10.0).round() / 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn fact(category: &str, location: &str, status: &str, severity: &str) -> ComplaintFacts {
        ComplaintFacts {
            category: category.to_string(),
            location: location.to_string(),
            status: status.to_string(),
            severity: severity.to_string(),
        }
    }

    #[test]
    fn test_counts_and_health_score() {
        let facts = vec![
            fact("Sanitation", "Northside", "pending", "High"),
            fact("Sanitation", "Northside", "in_progress", "High"),
            fact("Electricity", "Southside", "resolved", "High"),
            fact("Other", "Downtown", "pending", "Low"),
        ];
        let report = build_report(&facts, &[]);
        assert_eq!(report.total_complaints, 4);
        assert_eq!(report.pending_complaints, 2);
        assert_eq!(report.resolved_complaints, 1);
        assert_eq!(report.high_severity_unresolved, 2);
        assert_eq!(report.civic_health_score, 90.0);
    }

    #[test]
    fn test_health_score_floors_at_zero() {
        let facts: Vec<ComplaintFacts> = (0..25)
            .map(|_| fact("Other", "X", "pending", "High"))
            .collect();
        let report = build_report(&facts, &[]);
        assert_eq!(report.civic_health_score, 0.0);
    }

    #[test]
    fn test_category_histogram_sorted_descending() {
        let facts = vec![
            fact("Water Supply", "A", "pending", "Low"),
            fact("Sanitation", "A", "pending", "Low"),
            fact("Sanitation", "A", "pending", "Low"),
        ];
        let report = build_report(&facts, &[]);
        assert_eq!(report.complaints_by_category[0].category, "Sanitation");
        assert_eq!(report.complaints_by_category[0].count, 2);
        assert_eq!(report.complaints_by_category[1].count, 1);
    }

    #[test]
    fn test_locations_keyed_by_first_segment_and_truncated() {
        let facts = vec![
            fact("Other", "Northside, Ward 4", "pending", "Low"),
            fact("Other", "Northside , Ward 6", "pending", "Low"),
            fact("Other", "Southside", "pending", "Low"),
            fact("Other", "Downtown", "pending", "Low"),
            fact("Other", "Harbor", "pending", "Low"),
        ];
        let report = build_report(&facts, &[]);
        assert_eq!(report.top_3_locations.len(), 3);
        assert_eq!(
            report.top_3_locations[0],
            LocationCount {
                location: "Northside".to_string(),
                count: 2
            }
        );
    }

    #[test]
    fn test_empty_location_buckets_as_unknown() {
        let facts = vec![fact("Other", "  ", "pending", "Low")];
        let report = build_report(&facts, &[]);
        assert_eq!(report.top_3_locations[0].location, "Unknown");
    }

    #[test]
    fn test_avg_resolution_hours_none_without_pairs() {
        assert_eq!(avg_resolution_hours(&[]), None);
    }

    #[test]
    fn test_avg_resolution_hours_rounds_to_one_decimal() {
        let created = Utc::now();
        let pairs = vec![
            ResolutionPair {
                created_at: created,
                resolved_at: created + Duration::hours(2),
            },
            ResolutionPair {
                created_at: created,
                resolved_at: created + Duration::minutes(90),
            },
        ];
        // (2.0 + 1.5) / 2 = 1.75 → 1.8
        assert_eq!(avg_resolution_hours(&pairs), Some(1.8));
    }
}
