//! Complaint lifecycle orchestration.
//!
//! Submission pipeline:
//!   1. classify (model failure → user-declared fallback)
//!   2. embed title+description (failure → skip duplicate detection)
//!   3. scan stored vectors for a near-duplicate
//!   4. compute the initial priority score
//!   5. insert the complaint (the one fatal write)
//!   6. store the embedding (non-fatal)
//!   7. refresh the duplicate parent's priority (non-fatal)
//!
//! The complaint row is written before its embedding so a failure between the
//! two never leaves an orphaned vector.

use chrono::Utc;
use sqlx::{PgPool, QueryBuilder};
use tracing::{info, warn};
use uuid::Uuid;

use crate::complaints::handlers::{ComplaintCreate, ListQuery};
use crate::complaints::priority::compute_priority_score;
use crate::complaints::similarity::find_duplicate;
use crate::complaints::triage::resolve_triage;
use crate::errors::AppError;
use crate::models::complaint::{ComplaintRow, ComplaintStatus, ComplaintWithVotes, VectorRow};
use crate::state::AppState;

const VOTE_COUNT_SUBQUERY: &str =
    "(SELECT COUNT(*) FROM votes v WHERE v.complaint_id = c.id) AS vote_count";

pub struct ComplaintPage {
    pub complaints: Vec<ComplaintWithVotes>,
    pub total: i64,
}

#[derive(Debug)]
pub struct VoteOutcome {
    pub complaint_id: Uuid,
    pub vote_count: i64,
}

pub async fn submit_complaint(
    state: &AppState,
    input: ComplaintCreate,
    user_id: Uuid,
) -> Result<ComplaintWithVotes, AppError> {
    let ai = match state
        .classifier
        .classify(&input.title, &input.description)
        .await
    {
        Ok(c) => Some(c),
        Err(e) => {
            warn!("classifier unavailable, falling back to user triage: {e}");
            None
        }
    };
    let triage = resolve_triage(&input, ai);

    let full_text = format!("{} {}", input.title, input.description);
    let embedding = match state.embedder.embed(&full_text).await {
        Ok(v) => Some(v),
        Err(e) => {
            warn!("embedding unavailable, skipping duplicate detection: {e}");
            None
        }
    };

    let mut is_duplicate = false;
    let mut duplicate_of: Option<Uuid> = None;
    let mut duplicate_count: i64 = 0;

    if let Some(embedding) = &embedding {
        let stored: Vec<VectorRow> =
            sqlx::query_as("SELECT complaint_id, embedding FROM complaint_vectors")
                .fetch_all(&state.db)
                .await?;

        if let Some(m) = find_duplicate(embedding, &stored) {
            is_duplicate = true;
            duplicate_of = Some(m.complaint_id);
            // How many complaints already point at this parent — feeds the
            // new complaint's own score.
            duplicate_count =
                sqlx::query_scalar("SELECT COUNT(*) FROM complaints WHERE duplicate_of = $1")
                    .bind(m.complaint_id)
                    .fetch_one(&state.db)
                    .await?;
            info!(
                parent = %m.complaint_id,
                similarity = m.similarity,
                "submission flagged as duplicate"
            );
        }
    }

    let now = Utc::now();
    let priority = compute_priority_score(
        triage.severity,
        0,
        duplicate_count,
        now,
        ComplaintStatus::Pending.as_str(),
    );

    let row: ComplaintRow = sqlx::query_as(
        r#"
        INSERT INTO complaints
            (id, user_id, title, description, category, severity, priority_score,
             location, status, image_url, ai_summary, keywords, is_duplicate,
             duplicate_of, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(&input.title)
    .bind(&input.description)
    .bind(triage.category)
    .bind(triage.severity)
    .bind(priority)
    .bind(&input.location)
    .bind(ComplaintStatus::Pending.as_str())
    .bind(&input.image_url)
    .bind(&triage.summary)
    .bind(&triage.keywords)
    .bind(is_duplicate)
    .bind(duplicate_of)
    .bind(now)
    .fetch_one(&state.db)
    .await?;

    if let Some(embedding) = &embedding {
        let encoded = serde_json::to_string(embedding).unwrap_or_default();
        if let Err(e) =
            sqlx::query("INSERT INTO complaint_vectors (complaint_id, embedding) VALUES ($1, $2)")
                .bind(row.id)
                .bind(encoded)
                .execute(&state.db)
                .await
        {
            // The complaint itself is durable; losing the vector only means
            // this report cannot be matched as a future duplicate parent.
            warn!(complaint_id = %row.id, "failed to store embedding: {e}");
        }
    }

    if let Some(parent) = duplicate_of {
        if let Err(e) = refresh_priority(&state.db, parent).await {
            warn!(complaint_id = %parent, "priority refresh after duplicate failed: {e}");
        }
    }

    Ok(ComplaintWithVotes {
        complaint: row,
        vote_count: 0,
    })
}

/// Recomputes a complaint's priority score from durable state: current
/// severity/status/creation time plus fresh vote and duplicate-child counts.
/// Missing rows are a no-op — the triggering action must not fail over a
/// stale score.
pub async fn refresh_priority(pool: &PgPool, complaint_id: Uuid) -> Result<(), sqlx::Error> {
    let row: Option<ComplaintRow> = sqlx::query_as("SELECT * FROM complaints WHERE id = $1")
        .bind(complaint_id)
        .fetch_optional(pool)
        .await?;
    let Some(c) = row else {
        return Ok(());
    };

    let votes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM votes WHERE complaint_id = $1")
        .bind(complaint_id)
        .fetch_one(pool)
        .await?;
    let duplicates: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM complaints WHERE duplicate_of = $1")
            .bind(complaint_id)
            .fetch_one(pool)
            .await?;

    let score = compute_priority_score(&c.severity, votes, duplicates, c.created_at, &c.status);
    sqlx::query("UPDATE complaints SET priority_score = $1 WHERE id = $2")
        .bind(score)
        .bind(complaint_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn list_complaints(pool: &PgPool, query: &ListQuery) -> Result<ComplaintPage, AppError> {
    let mut qb = QueryBuilder::new(format!(
        "SELECT c.*, {VOTE_COUNT_SUBQUERY} FROM complaints c WHERE 1=1"
    ));
    push_filters(&mut qb, query);

    // Sort column is whitelisted, never interpolated from raw input.
    let order = match query.sort_by.as_deref() {
        Some("created_at") => " ORDER BY c.created_at DESC",
        _ => " ORDER BY c.priority_score DESC",
    };
    qb.push(order);

    let page_size = query.page_size();
    let offset = (query.page() - 1) * page_size;
    qb.push(" LIMIT ");
    qb.push_bind(page_size);
    qb.push(" OFFSET ");
    qb.push_bind(offset);

    let complaints: Vec<ComplaintWithVotes> = qb.build_query_as().fetch_all(pool).await?;

    let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM complaints c WHERE 1=1");
    push_filters(&mut count_qb, query);
    let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

    Ok(ComplaintPage { complaints, total })
}

fn push_filters<'a>(qb: &mut QueryBuilder<'a, sqlx::Postgres>, query: &'a ListQuery) {
    if let Some(location) = &query.location {
        qb.push(" AND c.location ILIKE ");
        qb.push_bind(format!("%{location}%"));
    }
    if let Some(category) = &query.category {
        qb.push(" AND c.category = ");
        qb.push_bind(category);
    }
    if let Some(status) = &query.status {
        qb.push(" AND c.status = ");
        qb.push_bind(status);
    }
}

pub async fn get_complaint(pool: &PgPool, complaint_id: Uuid) -> Result<ComplaintWithVotes, AppError> {
    let row: Option<ComplaintWithVotes> = sqlx::query_as(&format!(
        "SELECT c.*, {VOTE_COUNT_SUBQUERY} FROM complaints c WHERE c.id = $1"
    ))
    .bind(complaint_id)
    .fetch_optional(pool)
    .await?;

    row.ok_or_else(|| AppError::NotFound(format!("Complaint {complaint_id} not found")))
}

/// Records one upvote per (user, complaint) pair. Uniqueness rides on the
/// votes table constraint — the insert is an atomic check-and-insert, so two
/// concurrent votes from the same user cannot both land.
pub async fn vote_on_complaint(
    pool: &PgPool,
    complaint_id: Uuid,
    user_id: Uuid,
) -> Result<VoteOutcome, AppError> {
    let exists: Option<Uuid> = sqlx::query_scalar("SELECT id FROM complaints WHERE id = $1")
        .bind(complaint_id)
        .fetch_optional(pool)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound(format!(
            "Complaint {complaint_id} not found"
        )));
    }

    let inserted = sqlx::query(
        "INSERT INTO votes (id, complaint_id, user_id) VALUES ($1, $2, $3)
         ON CONFLICT (complaint_id, user_id) DO NOTHING",
    )
    .bind(Uuid::new_v4())
    .bind(complaint_id)
    .bind(user_id)
    .execute(pool)
    .await?;

    check_vote_landed(inserted.rows_affected())?;

    if let Err(e) = refresh_priority(pool, complaint_id).await {
        warn!(complaint_id = %complaint_id, "priority refresh after vote failed: {e}");
    }

    let vote_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM votes WHERE complaint_id = $1")
        .bind(complaint_id)
        .fetch_one(pool)
        .await?;

    Ok(VoteOutcome {
        complaint_id,
        vote_count,
    })
}

/// Maps the ON CONFLICT DO NOTHING outcome: zero rows affected means the
/// (user, complaint) vote already exists.
fn check_vote_landed(rows_affected: u64) -> Result<(), AppError> {
    if rows_affected == 0 {
        return Err(AppError::Conflict(
            "You have already voted on this complaint".to_string(),
        ));
    }
    Ok(())
}

/// Resolved is terminal. Rejecting the second resolve (rather than re-running
/// the update) keeps resolution_logs at exactly one entry per resolution.
fn ensure_resolvable(status: &str) -> Result<(), AppError> {
    if status == ComplaintStatus::Resolved.as_str() {
        return Err(AppError::Conflict(
            "Complaint is already resolved".to_string(),
        ));
    }
    Ok(())
}

/// Marks a complaint resolved and appends the resolution log entry, in one
/// transaction. Resolved is terminal: a second resolve is a Conflict, which
/// keeps the log at exactly one entry per resolution.
pub async fn resolve_complaint(
    pool: &PgPool,
    complaint_id: Uuid,
    admin_id: Uuid,
    note: &str,
) -> Result<(), AppError> {
    let status: Option<String> = sqlx::query_scalar("SELECT status FROM complaints WHERE id = $1")
        .bind(complaint_id)
        .fetch_optional(pool)
        .await?;
    let status = status.ok_or_else(|| {
        AppError::NotFound(format!("Complaint {complaint_id} not found"))
    })?;
    ensure_resolvable(&status)?;

    let mut tx = pool.begin().await?;
    sqlx::query("UPDATE complaints SET status = $1 WHERE id = $2")
        .bind(ComplaintStatus::Resolved.as_str())
        .bind(complaint_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query(
        "INSERT INTO resolution_logs (id, complaint_id, resolved_by, resolution_note, resolved_at)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(Uuid::new_v4())
    .bind(complaint_id)
    .bind(admin_id)
    .bind(note)
    .bind(Utc::now())
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vote_insert_conflict_rejects_second_vote() {
        assert!(matches!(
            check_vote_landed(0),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn test_vote_insert_success_is_accepted() {
        assert!(check_vote_landed(1).is_ok());
    }

    #[test]
    fn test_second_resolve_is_a_conflict() {
        assert!(matches!(
            ensure_resolvable(ComplaintStatus::Resolved.as_str()),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn test_unresolved_statuses_can_be_resolved() {
        assert!(ensure_resolvable(ComplaintStatus::Pending.as_str()).is_ok());
        assert!(ensure_resolvable(ComplaintStatus::InProgress.as_str()).is_ok());
    }
}
