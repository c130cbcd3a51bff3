use axum::Json;
use serde_json::{json, Value};

/// GET /health
/// Simple probe for load balancers / deployment checks.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "civiq-api"
    }))
}
