use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{AdminUser, AuthUser};
use crate::complaints::service;
use crate::errors::AppError;
use crate::models::complaint::{ComplaintCategory, ComplaintWithVotes, Severity};
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct ComplaintCreate {
    pub title: String,
    pub description: String,
    pub category: ComplaintCategory,
    pub severity: Severity,
    pub location: String,
    pub image_url: Option<String>,
}

impl ComplaintCreate {
    /// Trims free-text fields and enforces the length bounds the original
    /// intake form promises. Category/severity are already closed enums at
    /// deserialization time.
    pub fn validate(&mut self) -> Result<(), AppError> {
        self.title = self.title.trim().to_string();
        self.description = self.description.trim().to_string();
        self.location = self.location.trim().to_string();

        check_length("title", &self.title, 5, 200)?;
        check_length("description", &self.description, 10, 2000)?;
        check_length("location", &self.location, 3, 200)?;
        Ok(())
    }
}

fn check_length(field: &str, value: &str, min: usize, max: usize) -> Result<(), AppError> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(AppError::Validation(format!(
            "{field} must be between {min} and {max} characters"
        )));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    /// "priority_score" (default) | "created_at"
    pub sort_by: Option<String>,
}

impl ListQuery {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn page_size(&self) -> i64 {
        self.page_size.unwrap_or(20).clamp(1, 100)
    }
}

#[derive(Debug, Serialize)]
pub struct ComplaintListResponse {
    pub complaints: Vec<ComplaintWithVotes>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub resolution_note: String,
}

#[derive(Debug, Serialize)]
pub struct VoteResponse {
    pub complaint_id: Uuid,
    pub vote_count: i64,
}

#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub complaint_id: Uuid,
    pub status: &'static str,
}

/// POST /complaints
/// Submit a new civic complaint. Triggers classification, duplicate
/// detection, and priority scoring. Rate limited per user.
pub async fn handle_submit(
    State(state): State<AppState>,
    user: AuthUser,
    Json(mut req): Json<ComplaintCreate>,
) -> Result<(StatusCode, Json<ComplaintWithVotes>), AppError> {
    req.validate()?;

    if !state.rate_limiter.check_and_record(user.user_id).await {
        return Err(AppError::RateLimited(format!(
            "Rate limit exceeded. Max {} complaints per hour.",
            state.config.rate_limit_complaints
        )));
    }

    let complaint = service::submit_complaint(&state, req, user.user_id).await?;
    Ok((StatusCode::CREATED, Json(complaint)))
}

/// GET /complaints
/// Public listing with filters and pagination, sorted by priority score by
/// default.
pub async fn handle_list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ComplaintListResponse>, AppError> {
    let page = service::list_complaints(&state.db, &query).await?;
    Ok(Json(ComplaintListResponse {
        complaints: page.complaints,
        total: page.total,
        page: query.page(),
        page_size: query.page_size(),
    }))
}

/// GET /complaints/:id
pub async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ComplaintWithVotes>, AppError> {
    let complaint = service::get_complaint(&state.db, id).await?;
    Ok(Json(complaint))
}

/// POST /complaints/:id/vote
/// One vote per user per complaint; voting refreshes the priority score.
pub async fn handle_vote(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<VoteResponse>, AppError> {
    let outcome = service::vote_on_complaint(&state.db, id, user.user_id).await?;
    Ok(Json(VoteResponse {
        complaint_id: outcome.complaint_id,
        vote_count: outcome.vote_count,
    }))
}

/// PATCH /complaints/:id/resolve (admin only)
pub async fn handle_resolve(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ResolveRequest>,
) -> Result<Json<ResolveResponse>, AppError> {
    let note = req.resolution_note.trim();
    check_length("resolution_note", note, 5, 1000)?;

    service::resolve_complaint(&state.db, id, admin.0.user_id, note).await?;
    Ok(Json(ResolveResponse {
        complaint_id: id,
        status: crate::models::complaint::ComplaintStatus::Resolved.as_str(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_create() -> ComplaintCreate {
        ComplaintCreate {
            title: "Burst water main".to_string(),
            description: "Water has been flooding the street since morning.".to_string(),
            category: ComplaintCategory::WaterSupply,
            severity: Severity::High,
            location: "Elm Street, Northside".to_string(),
            image_url: None,
        }
    }

    #[test]
    fn test_valid_input_passes() {
        assert!(valid_create().validate().is_ok());
    }

    #[test]
    fn test_short_title_is_rejected() {
        let mut c = valid_create();
        c.title = "Pipe".to_string();
        assert!(matches!(c.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_whitespace_is_trimmed_before_length_check() {
        let mut c = valid_create();
        c.title = "   ab   ".to_string();
        assert!(c.validate().is_err());
        let mut c = valid_create();
        c.location = "  Elm Street  ".to_string();
        c.validate().unwrap();
        assert_eq!(c.location, "Elm Street");
    }

    #[test]
    fn test_oversized_description_is_rejected() {
        let mut c = valid_create();
        c.description = "d".repeat(2001);
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_page_defaults_and_clamps() {
        let q = ListQuery {
            page: Some(0),
            page_size: Some(500),
            location: None,
            category: None,
            status: None,
            sort_by: None,
        };
        assert_eq!(q.page(), 1);
        assert_eq!(q.page_size(), 100);
    }
}
