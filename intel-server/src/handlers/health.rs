//! Health and version handlers

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use intel_core::cache::KEY_UNIFIED_THREATS;
use serde::Serialize;
use serde_json::Value;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    timestamp: i64,
    cache: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_refresh_age_seconds: Option<i64>,
}

pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    let cache_ok = state.cache.get_json::<Value>(KEY_UNIFIED_THREATS).is_ok();
    let last_refresh_age_seconds = state
        .last_refresh
        .read()
        .map(|at| Utc::now().signed_duration_since(at).num_seconds());

    Json(HealthResponse {
        status: if cache_ok { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now().timestamp(),
        cache: if cache_ok { "ok" } else { "unavailable" },
        last_refresh_age_seconds,
    })
}

#[derive(Serialize)]
pub struct VersionResponse {
    version: &'static str,
    phase: &'static str,
}

pub async fn version() -> Json<VersionResponse> {
    Json(VersionResponse {
        version: env!("CARGO_PKG_VERSION"),
        phase: "enhanced-scoring",
    })
}
