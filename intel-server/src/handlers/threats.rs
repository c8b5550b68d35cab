//! Threat list handlers

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use chrono::{DateTime, Utc};
use intel_core::cache::{KEY_BLOCKED_DOMAINS, KEY_TOP_THREATS, KEY_UNIFIED_THREATS};
use intel_core::types::{BatchStats, RankedBatch, Severity, ThreatRecord};
use serde::{Deserialize, Serialize};

use super::cached_json;
use crate::error::{AppError, AppResult};
use crate::refresh::{self, TopSnapshot};
use crate::AppState;

const LIMIT_DEFAULT: usize = 50;
const LIMIT_MAX: usize = 100;

#[derive(Debug, Deserialize, Default)]
pub struct ThreatQuery {
    pub limit: Option<usize>,
    /// ISO-8601 lower bound on `published`.
    pub after: Option<DateTime<Utc>>,
    pub tag: Option<String>,
    /// Case-insensitive substring over title and description.
    pub q: Option<String>,
    pub severity: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ThreatsResponse {
    pub updated: DateTime<Utc>,
    pub count: usize,
    pub items: Vec<ThreatRecord>,
    pub correlation_stats: BatchStats,
}

#[derive(Debug, Serialize)]
pub struct TopResponse {
    pub updated: DateTime<Utc>,
    pub count: usize,
    pub items: Vec<ThreatRecord>,
}

/// List processed threats from the cached batch, with post-hoc filters.
/// A cache miss triggers a synchronous recompute.
pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ThreatQuery>,
) -> AppResult<Response> {
    let severity = parse_severity(query.severity.as_deref())?;
    let limit = query.limit.unwrap_or(LIMIT_DEFAULT).min(LIMIT_MAX);

    let batch = cached_batch(&state).await?;
    let blocked = blocked_domains(&state);

    let items: Vec<ThreatRecord> = batch
        .items
        .iter()
        .filter(|r| !is_blocked(&r.link, &blocked))
        .filter(|r| query.after.map_or(true, |after| r.published > after))
        .filter(|r| {
            query.tag.as_deref().map_or(true, |tag| {
                r.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
            })
        })
        .filter(|r| {
            query.q.as_deref().map_or(true, |q| {
                let q = q.to_lowercase();
                r.title.to_lowercase().contains(&q) || r.description.to_lowercase().contains(&q)
            })
        })
        .filter(|r| severity.map_or(true, |s| r.risk.severity == s))
        .take(limit)
        .cloned()
        .collect();

    let response = ThreatsResponse {
        updated: batch.updated,
        count: items.len(),
        items,
        correlation_stats: batch.stats,
    };
    cached_json(&headers, &response, state.config.cache_ttl_seconds)
}

/// The precomputed top-N slice.
pub async fn top(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ThreatQuery>,
) -> AppResult<Response> {
    let snapshot: TopSnapshot = match state.cache.get_json(KEY_TOP_THREATS)? {
        Some(snapshot) => snapshot,
        None => {
            let batch = refresh::run_cycle(&state).await?;
            state
                .cache
                .get_json(KEY_TOP_THREATS)?
                .unwrap_or(TopSnapshot {
                    updated: batch.updated,
                    items: Vec::new(),
                })
        }
    };

    let blocked = blocked_domains(&state);
    let mut items: Vec<ThreatRecord> = snapshot
        .items
        .into_iter()
        .filter(|r| !is_blocked(&r.link, &blocked))
        .collect();
    if let Some(limit) = query.limit {
        items.truncate(limit.min(LIMIT_MAX));
    }

    let response = TopResponse {
        updated: snapshot.updated,
        count: items.len(),
        items,
    };
    cached_json(&headers, &response, state.config.cache_ttl_seconds)
}

/// The cached unified batch, recomputed on the spot if the TTL lapsed.
async fn cached_batch(state: &AppState) -> AppResult<RankedBatch> {
    match state.cache.get_json(KEY_UNIFIED_THREATS)? {
        Some(batch) => Ok(batch),
        None => {
            tracing::debug!("unified batch expired, recomputing");
            refresh::run_cycle(state).await
        }
    }
}

fn parse_severity(raw: Option<&str>) -> AppResult<Option<Severity>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    match raw.to_uppercase().as_str() {
        "CRITICAL" => Ok(Some(Severity::Critical)),
        "HIGH" => Ok(Some(Severity::High)),
        "MEDIUM" => Ok(Some(Severity::Medium)),
        "LOW" => Ok(Some(Severity::Low)),
        "INFO" => Ok(Some(Severity::Info)),
        other => Err(AppError::BadRequest(format!(
            "unknown severity '{}'",
            other
        ))),
    }
}

/// The operator-maintained blocklist; absent or unreadable means empty.
fn blocked_domains(state: &AppState) -> Vec<String> {
    match state.cache.get_json::<Vec<String>>(KEY_BLOCKED_DOMAINS) {
        Ok(Some(domains)) => domains.into_iter().map(|d| d.to_lowercase()).collect(),
        Ok(None) => Vec::new(),
        Err(e) => {
            tracing::warn!(error = %e, "blocked domain list unreadable, serving unfiltered");
            Vec::new()
        }
    }
}

/// Match the link's host against the blocklist, including subdomains.
fn is_blocked(link: &str, blocked: &[String]) -> bool {
    if blocked.is_empty() {
        return false;
    }
    let host = link
        .trim()
        .strip_prefix("https://")
        .or_else(|| link.trim().strip_prefix("http://"))
        .unwrap_or(link)
        .split('/')
        .next()
        .unwrap_or("")
        .to_lowercase();
    blocked
        .iter()
        .any(|b| host == *b || host.ends_with(&format!(".{}", b)))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_blocked_matches_host_and_subdomains() {
        let blocked = vec!["badfeed.example".to_string()];
        assert!(is_blocked("https://badfeed.example/a", &blocked));
        assert!(is_blocked("https://rss.badfeed.example/a", &blocked));
        assert!(!is_blocked("https://goodfeed.example/a", &blocked));
        assert!(!is_blocked("https://notbadfeed.example/a", &blocked));
    }

    #[test]
    fn test_parse_severity() {
        assert_eq!(parse_severity(Some("high")).unwrap(), Some(Severity::High));
        assert_eq!(
            parse_severity(Some("CRITICAL")).unwrap(),
            Some(Severity::Critical)
        );
        assert_eq!(parse_severity(None).unwrap(), None);
        assert!(parse_severity(Some("extreme")).is_err());
    }
}
