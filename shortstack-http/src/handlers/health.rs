use axum::{extract::State, Json};
use std::sync::Arc;

use super::AppState;

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Server is healthy", body = serde_json::Value)
    )
)]
pub async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "tenants_resident": state.registry.resident_tenants(),
        "active_workers": state.registry.active_workers().await,
        "uptime_secs": state.start_time.elapsed().as_secs(),
        "build_profile": if cfg!(debug_assertions) { "debug" } else { "release" },
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
