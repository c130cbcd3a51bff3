use axum::{extract::State, Json};

use crate::analytics::rollup::AnalyticsReport;
use crate::analytics::service::{self, LocalitySummaryResponse};
use crate::auth::AdminUser;
use crate::errors::AppError;
use crate::state::AppState;

/// GET /analytics (admin only)
/// Aggregate counts, category/location breakdowns, resolution latency, and
/// the civic health score.
pub async fn handle_analytics(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<AnalyticsReport>, AppError> {
    let report = service::get_analytics(&state.db).await?;
    Ok(Json(report))
}

/// GET /analytics/locality-summary (admin only)
/// AI narrative over the 20 most recent unresolved complaints.
pub async fn handle_locality_summary(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<LocalitySummaryResponse>, AppError> {
    let summary = service::get_locality_summary(&state).await?;
    Ok(Json(summary))
}
