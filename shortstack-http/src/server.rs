use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers::{get_tenant_stats, health, update_tenant_stats, AppState};
use crate::openapi::ApiDoc;
use shortstack::{
    CorpusStore, MemoryCorpusStore, MemoryVectorIndex, RestCorpusStore, RestVectorIndex,
    StatsConfig, StatsRegistry, VectorIndexClient,
};

pub async fn serve() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let data_dir = std::env::var("SHORTSTACK_DATA_DIR").unwrap_or_else(|_| "./data".to_string());
    let bind_addr =
        std::env::var("SHORTSTACK_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:7700".to_string());
    let config = StatsConfig::from_env();

    let corpus = match std::env::var("SHORTSTACK_CORPUS_URL").ok().filter(|u| !u.is_empty()) {
        Some(url) => {
            tracing::info!("Corpus store: {}", url);
            CorpusStore::Rest(RestCorpusStore::new(url))
        }
        None => {
            tracing::info!("Corpus store: in-process (SHORTSTACK_CORPUS_URL not set)");
            CorpusStore::Memory(MemoryCorpusStore::new())
        }
    };

    let vectors = match std::env::var("SHORTSTACK_VECTOR_URL").ok().filter(|u| !u.is_empty()) {
        Some(url) => {
            tracing::info!("Vector index: {}", url);
            let api_key = std::env::var("SHORTSTACK_VECTOR_API_KEY")
                .ok()
                .filter(|k| !k.is_empty());
            VectorIndexClient::Rest(RestVectorIndex::new(url, api_key))
        }
        None => {
            tracing::info!("Vector index: in-process (SHORTSTACK_VECTOR_URL not set)");
            VectorIndexClient::Memory(MemoryVectorIndex::new())
        }
    };

    tracing::info!(
        idle_timeout_secs = config.idle_timeout.as_secs(),
        batch_size = config.batch_size,
        reindex_upsert_batch_size = config.reindex_upsert_batch_size,
        data_dir = %data_dir,
        "Stats configuration loaded"
    );

    let registry = StatsRegistry::new(corpus, vectors, &data_dir, config);
    let state = Arc::new(AppState {
        registry,
        start_time: std::time::Instant::now(),
    });

    let app = Router::new()
        .route("/health", get(health))
        .route("/tenant-stats/update", post(update_tenant_stats))
        .route("/tenant-stats/:tenant_id", get(get_tenant_stats))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Shortstack v{} listening on {}", env!("CARGO_PKG_VERSION"), bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
