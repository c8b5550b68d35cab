//! IntelStream aggregation server
//!
//! Collects threat intelligence feeds on a schedule, runs them through the
//! processing pipeline (normalize, dedup, correlate, enrich, score, rank)
//! and serves the ranked batch over a read-only JSON API backed by a TTL
//! cache.

mod config;
mod error;
mod feeds;
mod handlers;
mod refresh;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use axum::{routing::get, Router};
use chrono::{DateTime, Utc};
use intel_core::cache::{CacheGateway, MemoryStore, SqliteStore};
use intel_core::enrich::ProfileSet;
use intel_core::Pipeline;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "intel_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    tracing::info!("IntelStream server starting...");

    let cache = match &config.cache_db_path {
        Some(path) => {
            tracing::info!("Cache: sqlite at {}", path);
            let store = SqliteStore::open(path).context("failed to open cache database")?;
            Arc::new(CacheGateway::new(Box::new(store), config.cache_ttl_seconds))
        }
        None => {
            tracing::info!("Cache: in-memory");
            Arc::new(CacheGateway::new(
                Box::new(MemoryStore::new()),
                config.cache_ttl_seconds,
            ))
        }
    };

    let profiles = match &config.profile_path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read profile set at {}", path))?;
            ProfileSet::from_json(&json).context("invalid profile set")?
        }
        None => ProfileSet::builtin(),
    };

    let feed_sources = match &config.feed_dir {
        Some(dir) => feeds::file_feeds(Path::new(dir)),
        None if !config.is_production() => {
            tracing::info!("FEED_DIR unset, serving the bundled sample feed");
            vec![feeds::sample_feed()]
        }
        None => Vec::new(),
    };
    tracing::info!("Feeds: {} configured", feed_sources.len());

    let state = AppState {
        config: config.clone(),
        cache,
        pipeline: Arc::new(Pipeline::new(profiles)),
        feeds: Arc::new(feed_sources),
        last_refresh: Arc::new(parking_lot::RwLock::new(None)),
    };

    // Warm the cache before accepting traffic; a failure here is logged and
    // the first request recomputes instead.
    if let Err(e) = refresh::run_cycle(&state).await {
        tracing::error!(error = ?e, "initial refresh failed");
    }
    tokio::spawn(refresh::scheduler(state.clone()));

    let app = create_router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: config::Config,
    pub cache: Arc<CacheGateway>,
    pub pipeline: Arc<Pipeline>,
    pub feeds: Arc<Vec<Arc<dyn feeds::FeedSource>>>,
    pub last_refresh: Arc<parking_lot::RwLock<Option<DateTime<Utc>>>>,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::check))
        .route("/version", get(handlers::health::version))
        .route("/api/threats", get(handlers::threats::list))
        .route("/api/top", get(handlers::threats::top))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// An AppState over an in-memory cache and the given feeds.
    pub fn test_state(sources: Vec<Arc<dyn feeds::FeedSource>>) -> AppState {
        let config = config::Config {
            port: 0,
            refresh_interval_seconds: 3600,
            cache_ttl_seconds: 1800,
            feed_timeout_seconds: 2,
            feed_dir: None,
            cache_db_path: None,
            profile_path: None,
            top_n: 10,
            environment: "test".to_string(),
        };
        AppState {
            config,
            cache: Arc::new(CacheGateway::new(Box::new(MemoryStore::new()), 1800)),
            pipeline: Arc::new(Pipeline::default()),
            feeds: Arc::new(sources),
            last_refresh: Arc::new(parking_lot::RwLock::new(None)),
        }
    }
}
