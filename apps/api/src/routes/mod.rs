pub mod health;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::analytics::handlers as analytics_handlers;
use crate::complaints::handlers as complaint_handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Complaints: submission requires auth, reading is public
        .route(
            "/complaints",
            post(complaint_handlers::handle_submit).get(complaint_handlers::handle_list),
        )
        .route("/complaints/:id", get(complaint_handlers::handle_get))
        .route("/complaints/:id/vote", post(complaint_handlers::handle_vote))
        .route(
            "/complaints/:id/resolve",
            patch(complaint_handlers::handle_resolve),
        )
        // Analytics: admin only
        .route("/analytics", get(analytics_handlers::handle_analytics))
        .route(
            "/analytics/locality-summary",
            get(analytics_handlers::handle_locality_summary),
        )
        .with_state(state)
}
