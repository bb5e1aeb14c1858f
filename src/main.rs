mod config;
mod models;
mod routes;
mod services;

use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::services::{
    cache::MetadataCache,
    classifier::{Classifier, FilterPolicy},
    enrichment::{EnrichmentService, MetadataSource, TmdbClient, TvdbClient},
    filter::FilterService,
    upstream::AddonClient,
};

/// Application state shared across handlers
pub struct AppState {
    pub config: Config,
    pub upstream: AddonClient,
    pub enrichment: Arc<EnrichmentService>,
    pub filter: FilterService,
    pub provider_names: Vec<&'static str>,
    pub start_time: Instant,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "region_filter_addon=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    // Load configuration
    let config = Config::from_env();
    let port = config.port;

    tracing::info!("Starting Region Filter Addon v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.node_env);
    tracing::info!("Upstream addon: {}", config.upstream_url);

    // Upstream addon client
    let upstream = AddonClient::new(
        &config.upstream_url,
        config.upstream_timeout_ms,
        &config.user_agent,
    );

    // Enrichment providers; a missing API key disables that provider
    let mut sources: Vec<Arc<dyn MetadataSource>> = Vec::new();
    let mut provider_names = Vec::new();
    if let Some(key) = &config.tvdb_api_key {
        sources.push(Arc::new(TvdbClient::new(
            &config.tvdb_base_url,
            key,
            config.provider_timeout_ms,
            &config.user_agent,
        )));
        provider_names.push("tvdb");
    } else {
        tracing::warn!("TVDB_API_KEY not set, TheTVDB provider disabled");
    }
    if let Some(key) = &config.tmdb_api_key {
        sources.push(Arc::new(TmdbClient::new(
            &config.tmdb_base_url,
            key,
            config.provider_timeout_ms,
            &config.user_agent,
        )));
        provider_names.push("tmdb");
    } else {
        tracing::warn!("TMDB_API_KEY not set, TMDB provider disabled");
    }

    let cache = MetadataCache::new(Duration::from_secs(config.cache_ttl_seconds));
    let enrichment = Arc::new(EnrichmentService::new(sources, cache));
    tracing::info!(
        providers = ?provider_names,
        cache_ttl_seconds = config.cache_ttl_seconds,
        "Enrichment service initialized"
    );

    // Classification engine + orchestrator
    let classifier = Classifier::new(FilterPolicy::from_config(&config));
    let filter = FilterService::new(
        Arc::clone(&enrichment),
        classifier,
        config.enrich_concurrency,
    );
    tracing::info!("Filter service initialized");

    // Build application state
    let state = Arc::new(AppState {
        config,
        upstream,
        enrichment,
        filter,
        provider_names,
        start_time: Instant::now(),
    });

    // Build router
    let app = Router::new()
        // Health endpoints
        .route("/", get(routes::health::root))
        .route("/health", get(routes::health::health_check))
        // Addon protocol endpoints
        .route("/manifest.json", get(routes::addon::manifest))
        .route("/catalog/:kind/:id", get(routes::addon::catalog))
        .route(
            "/catalog/:kind/:id/:extra",
            get(routes::addon::catalog_with_extra),
        )
        .route("/meta/:kind/:id", get(routes::addon::meta))
        .route("/stream/:kind/:id", get(routes::addon::stream))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
