//! Addon protocol routes
//!
//! The proxy surface: catalog responses come back with blocked items
//! removed, a blocked meta comes back as `{ "meta": null }` (the client
//! treats it as nonexistent), streams pass through unfiltered.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::info;

use crate::models::{CatalogResponse, MetaResponse};
use crate::AppState;

/// Route ids arrive with the protocol's `.json` suffix attached
fn strip_json(id: &str) -> &str {
    id.strip_suffix(".json").unwrap_or(id)
}

/// GET /manifest.json
pub async fn manifest() -> impl IntoResponse {
    Json(serde_json::json!({
        "id": "org.regionfilter.addon",
        "version": env!("CARGO_PKG_VERSION"),
        "name": "Region Filter",
        "description": "Proxies an upstream catalog addon and removes unwanted regional content",
        "resources": ["catalog", "meta", "stream"],
        "types": ["movie", "series"],
        "catalogs": [],
        "idPrefixes": ["tt"],
        "behaviorHints": { "configurable": false }
    }))
}

/// GET /catalog/:kind/:id.json
pub async fn catalog(
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, String)>,
) -> impl IntoResponse {
    serve_catalog(state, kind, id, None).await
}

/// GET /catalog/:kind/:id/:extra.json (paginated/filtered catalogs)
pub async fn catalog_with_extra(
    State(state): State<Arc<AppState>>,
    Path((kind, id, extra)): Path<(String, String, String)>,
) -> impl IntoResponse {
    serve_catalog(state, kind, id, Some(extra)).await
}

async fn serve_catalog(
    state: Arc<AppState>,
    kind: String,
    id: String,
    extra: Option<String>,
) -> Json<CatalogResponse> {
    let id = strip_json(&id).to_string();
    let extra = extra.as_deref().map(strip_json);

    let metas = state.upstream.get_catalog(&kind, &id, extra).await;
    let requested = metas.len();
    let metas = state.filter.filter_batch(metas).await;

    info!(
        kind = %kind,
        id = %id,
        requested,
        returned = metas.len(),
        "catalog request served"
    );
    Json(CatalogResponse { metas })
}

/// GET /meta/:kind/:id.json
pub async fn meta(
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, String)>,
) -> impl IntoResponse {
    let id = strip_json(&id).to_string();

    let meta = match state.upstream.get_meta(&kind, &id).await {
        Some(item) => {
            info!(
                kind = %kind,
                id = %id,
                name = %item.name,
                country = ?item.country,
                genres = ?item.genres,
                "meta received from upstream"
            );
            state.filter.filter_one(item).await
        }
        None => None,
    };

    Json(MetaResponse { meta })
}

/// GET /stream/:kind/:id.json - passthrough, filtering is not defined
/// for the stream resource
pub async fn stream(
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, String)>,
) -> impl IntoResponse {
    let id = strip_json(&id).to_string();
    Json(state.upstream.get_streams(&kind, &id).await)
}
