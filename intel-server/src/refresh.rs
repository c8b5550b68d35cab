//! Refresh cycle
//!
//! One cycle: collect every feed, run the processing pipeline, write the
//! full batch, the precomputed top slice and the hour-bucketed stats entry
//! to the cache. A scheduled cycle and a request-triggered recompute may
//! overlap; both write whole snapshots, so the worst case is wasted work.

use std::time::Duration;

use chrono::{DateTime, Utc};
use intel_core::cache::{
    trends_key, KEY_SOURCES_APPROVED, KEY_TOP_THREATS, KEY_UNIFIED_THREATS,
};
use intel_core::rank::top_threats;
use intel_core::types::{RankedBatch, ThreatRecord};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::feeds::collect_all;
use crate::AppState;

/// The cached top-N slice, small enough to serve without touching the full
/// batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopSnapshot {
    pub updated: DateTime<Utc>,
    pub items: Vec<ThreatRecord>,
}

/// Run one full refresh cycle and return the fresh batch.
pub async fn run_cycle(state: &AppState) -> AppResult<RankedBatch> {
    let raw = collect_all(
        &state.feeds,
        Duration::from_secs(state.config.feed_timeout_seconds),
    )
    .await;

    let now = Utc::now();
    let batch = state.pipeline.run(raw, now);

    state.cache.put_json(KEY_UNIFIED_THREATS, &batch)?;
    state.cache.put_json(
        KEY_TOP_THREATS,
        &TopSnapshot {
            updated: batch.updated,
            items: top_threats(&batch.items, state.config.top_n),
        },
    )?;
    state.cache.put_json(&trends_key(now), &batch.stats)?;

    // Snapshot of the active source registry, for operator inspection.
    let approved: Vec<&str> = state.feeds.iter().map(|f| f.name()).collect();
    state.cache.put_json(KEY_SOURCES_APPROVED, &approved)?;

    *state.last_refresh.write() = Some(now);
    tracing::info!(
        items = batch.items.len(),
        raw = batch.stats.raw_count,
        "refresh cycle complete"
    );
    Ok(batch)
}

/// Scheduled refresh loop. The initial refresh happens at startup, so the
/// first tick here is swallowed.
pub async fn scheduler(state: AppState) {
    let mut interval =
        tokio::time::interval(Duration::from_secs(state.config.refresh_interval_seconds));
    interval.tick().await;
    loop {
        interval.tick().await;
        if let Err(e) = run_cycle(&state).await {
            tracing::error!(error = ?e, "scheduled refresh failed");
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feeds::StaticFeed;
    use crate::test_support::test_state;
    use intel_core::types::RawItem;
    use std::sync::Arc;

    fn item(title: &str, source: &str, tags: &[&str]) -> RawItem {
        RawItem {
            title: title.into(),
            link: format!("https://{}.example/{}", source, title.replace(' ', "-")),
            source: source.into(),
            published: Some(Utc::now()),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ..RawItem::default()
        }
    }

    #[tokio::test]
    async fn test_cycle_populates_cache_keys() {
        let state = test_state(vec![Arc::new(StaticFeed::new(
            "s1",
            vec![
                item("KEV exploited", "s1", &["KEV", "CVE-2024-1"]),
                item("phishing wave", "s1", &["phishing"]),
            ],
        ))]);

        let batch = run_cycle(&state).await.unwrap();
        assert_eq!(batch.items.len(), 2);

        let unified: Option<RankedBatch> = state.cache.get_json(KEY_UNIFIED_THREATS).unwrap();
        assert_eq!(unified.unwrap().items.len(), 2);

        let top: Option<TopSnapshot> = state.cache.get_json(KEY_TOP_THREATS).unwrap();
        let top = top.unwrap();
        assert_eq!(top.items.len(), 2);
        assert_eq!(top.updated, batch.updated);

        let stats: Option<intel_core::BatchStats> =
            state.cache.get_json(&trends_key(batch.updated)).unwrap();
        assert_eq!(stats.unwrap().raw_count, 2);

        let approved: Option<Vec<String>> = state.cache.get_json(KEY_SOURCES_APPROVED).unwrap();
        assert_eq!(approved.unwrap(), vec!["s1".to_string()]);

        assert!(state.last_refresh.read().is_some());
    }

    #[tokio::test]
    async fn test_cycle_with_no_feeds_writes_empty_batch() {
        let state = test_state(vec![]);
        let batch = run_cycle(&state).await.unwrap();
        assert!(batch.items.is_empty());
        let unified: Option<RankedBatch> = state.cache.get_json(KEY_UNIFIED_THREATS).unwrap();
        assert_eq!(unified.unwrap().stats.raw_count, 0);
    }

    #[tokio::test]
    async fn test_top_slice_is_clamped_to_top_n() {
        // Distinct headlines so nothing merges.
        let titles = [
            "botnet takedown in europe",
            "patch tuesday roundup",
            "credential stuffing surge",
            "new stealer sold on forums",
            "router firmware backdoor",
            "cloud bucket exposure",
            "mobile spyware campaign",
            "supply chain typosquat",
            "ics honeypot findings",
            "dns tunneling report",
            "npm package compromise",
            "vpn appliance advisory",
            "browser extension abuse",
            "atm jackpotting wave",
            "kerberos relay research",
        ];
        let items: Vec<RawItem> = titles.iter().map(|t| item(t, "s1", &[])).collect();
        let state = test_state(vec![Arc::new(StaticFeed::new("s1", items))]);

        run_cycle(&state).await.unwrap();
        let top: TopSnapshot = state.cache.get_json(KEY_TOP_THREATS).unwrap().unwrap();
        assert_eq!(top.items.len(), state.config.top_n);
    }
}
