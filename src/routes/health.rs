use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;

/// Root endpoint - basic status
pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": "Region Filter Addon",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "runtime": "rust",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: String,
    uptime: u64,
    upstream_url: String,
    cache_entries: usize,
    providers: Vec<&'static str>,
}

/// GET /health - status, uptime, cache stats
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let uptime = state.start_time.elapsed().as_secs();
    let cache_entries = state.enrichment.cache_entries().await;

    Json(HealthResponse {
        status: "ok".to_string(),
        uptime,
        upstream_url: state.config.upstream_url.clone(),
        cache_entries,
        providers: state.provider_names.clone(),
    })
}
