use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::platform::Readiness;
use crate::state::AppState;

/// GET /health
/// Service version plus the platform readiness.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let readiness = state.platform.readiness();
    let status = if readiness == Readiness::Ready {
        "ok"
    } else {
        "degraded"
    };
    Json(json!({
        "status": status,
        "version": env!("CARGO_PKG_VERSION"),
        "service": "resumeiq-api",
        "platform": readiness
    }))
}
