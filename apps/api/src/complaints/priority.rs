//! Priority score computation.
//!
//! The score is always a full recomputation from current state — never an
//! incremental update — so concurrent refreshes converge on the next pass.
//!
//! Formula:
//!     severity_weight + votes × 2.0 + duplicates × 1.5 + time_decay
//!
//! Severity weights: Low 1.0, Medium 5.0, High 10.0. Time decay is 0.5 per
//! unresolved day, capped at 20, and drops to 0 once resolved.

use chrono::{DateTime, Utc};

use crate::models::complaint::{ComplaintStatus, Severity};

pub const VOTE_MULTIPLIER: f64 = 2.0;
pub const DUPLICATE_MULTIPLIER: f64 = 1.5;
pub const TIME_DECAY_PER_DAY: f64 = 0.5;
pub const TIME_DECAY_CAP: f64 = 20.0;

/// Weight for a severity string. Unknown values default to the Low weight
/// rather than erroring — severity may come from stored rows predating the
/// closed enumeration.
pub fn severity_weight(severity: &str) -> f64 {
    match Severity::parse(severity) {
        Some(Severity::Low) | None => 1.0,
        Some(Severity::Medium) => 5.0,
        Some(Severity::High) => 10.0,
    }
}

/// Computes the priority score at the current wall-clock time.
pub fn compute_priority_score(
    severity: &str,
    vote_count: i64,
    duplicate_count: i64,
    created_at: DateTime<Utc>,
    status: &str,
) -> f64 {
    compute_priority_score_at(
        severity,
        vote_count,
        duplicate_count,
        created_at,
        status,
        Utc::now(),
    )
}

/// Deterministic core: the evaluation instant is a parameter.
pub fn compute_priority_score_at(
    severity: &str,
    vote_count: i64,
    duplicate_count: i64,
    created_at: DateTime<Utc>,
    status: &str,
    now: DateTime<Utc>,
) -> f64 {
    let mut total = severity_weight(severity)
        + vote_count as f64 * VOTE_MULTIPLIER
        + duplicate_count as f64 * DUPLICATE_MULTIPLIER;

    if status != ComplaintStatus::Resolved.as_str() {
        let days_old = (now - created_at).num_seconds() as f64 / 86_400.0;
        total += (days_old * TIME_DECAY_PER_DAY).min(TIME_DECAY_CAP);
    }

    (total * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_high_severity_fresh_pending_is_ten() {
        let now = Utc::now();
        assert_eq!(
            compute_priority_score_at("High", 0, 0, now, "pending", now),
            10.0
        );
    }

    #[test]
    fn test_votes_contribute_two_each() {
        let now = Utc::now();
        assert_eq!(
            compute_priority_score_at("Low", 10, 0, now, "pending", now),
            21.0
        );
    }

    #[test]
    fn test_duplicates_contribute_one_point_five_each() {
        let now = Utc::now();
        assert_eq!(
            compute_priority_score_at("Medium", 0, 3, now, "pending", now),
            9.5
        );
    }

    #[test]
    fn test_resolved_complaints_have_no_time_decay() {
        let now = Utc::now();
        let created = now - Duration::days(100);
        assert_eq!(
            compute_priority_score_at("High", 0, 0, created, "resolved", now),
            10.0
        );
    }

    #[test]
    fn test_time_decay_saturates_at_cap() {
        let now = Utc::now();
        let created = now - Duration::days(100);
        // 100 days × 0.5 would be 50; capped at 20.
        assert_eq!(
            compute_priority_score_at("Low", 0, 0, created, "pending", now),
            21.0
        );
    }

    #[test]
    fn test_partial_decay_rounds_to_two_decimals() {
        let now = Utc::now();
        let created = now - Duration::days(3);
        assert_eq!(
            compute_priority_score_at("Low", 0, 0, created, "pending", now),
            2.5
        );
    }

    #[test]
    fn test_unknown_severity_defaults_to_low_weight() {
        let now = Utc::now();
        assert_eq!(
            compute_priority_score_at("Catastrophic", 0, 0, now, "pending", now),
            1.0
        );
    }

    #[test]
    fn test_in_progress_still_decays() {
        let now = Utc::now();
        let created = now - Duration::days(2);
        assert_eq!(
            compute_priority_score_at("Low", 0, 0, created, "in_progress", now),
            2.0
        );
    }
}
