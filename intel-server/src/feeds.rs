//! Feed collection boundary
//!
//! Sources implement the blocking `FeedSource` trait; the collector runs
//! each one on the blocking pool under its own timeout. A failed or
//! timed-out feed is logged and dropped - one bad feed never aborts the
//! batch. Transport (HTTP/RSS) is out of scope here; file and in-process
//! sources cover deployment and tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use intel_core::error::{PipelineError, PipelineResult};
use intel_core::types::RawItem;

/// A single intelligence feed. `fetch` may block.
pub trait FeedSource: Send + Sync {
    fn name(&self) -> &str;
    fn fetch(&self) -> PipelineResult<Vec<RawItem>>;
}

// ============================================================================
// SOURCES
// ============================================================================

/// A fixed in-process batch, for tests and demos.
pub struct StaticFeed {
    name: String,
    items: Vec<RawItem>,
}

impl StaticFeed {
    pub fn new(name: impl Into<String>, items: Vec<RawItem>) -> Self {
        Self {
            name: name.into(),
            items,
        }
    }
}

impl FeedSource for StaticFeed {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self) -> PipelineResult<Vec<RawItem>> {
        Ok(self.items.clone())
    }
}

/// The bundled demo feed, served when no feed directory is configured in a
/// non-production environment so a fresh checkout shows data immediately.
pub fn sample_feed() -> Arc<dyn FeedSource> {
    let now = Utc::now();
    let item = |title: &str, link: &str, source: &str, tags: &[&str], hours_ago: i64| RawItem {
        title: title.into(),
        link: link.into(),
        source: source.into(),
        published: Some(now - ChronoDuration::hours(hours_ago)),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        ..RawItem::default()
    };
    Arc::new(StaticFeed::new(
        "sample",
        vec![
            item(
                "CISA adds CVE-2024-21412 to the KEV catalog",
                "https://www.cisa.gov/known-exploited-vulnerabilities-catalog",
                "CISA KEV",
                &["KEV", "CVE-2024-21412"],
                6,
            ),
            item(
                "LockBit affiliate activity targets healthcare providers",
                "https://blog.example-vendor.com/lockbit-healthcare",
                "VendorBlog",
                &["ransomware", "T1486"],
                20,
            ),
            item(
                "Phishing campaign abuses calendar invites",
                "https://news.example.com/calendar-phishing",
                "SecurityNews",
                &["phishing", "T1566.001"],
                40,
            ),
        ],
    ))
}

/// A JSON file containing an array of raw items, re-read on every cycle so
/// drop-in updates are picked up without a restart.
pub struct FileFeed {
    name: String,
    path: PathBuf,
}

impl FileFeed {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

impl FeedSource for FileFeed {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self) -> PipelineResult<Vec<RawItem>> {
        let data = fs::read_to_string(&self.path).map_err(|e| PipelineError::Fetch {
            feed: self.name.clone(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&data).map_err(|e| PipelineError::Parse(e.to_string()))
    }
}

/// One `FileFeed` per `*.json` file in the directory, named after the file
/// stem. A missing or unreadable directory yields no feeds.
pub fn file_feeds(dir: &Path) -> Vec<Arc<dyn FeedSource>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "feed directory unreadable");
            return Vec::new();
        }
    };

    let mut feeds: Vec<Arc<dyn FeedSource>> = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("feed")
            .to_string();
        feeds.push(Arc::new(FileFeed::new(name, path)));
    }
    feeds.sort_by(|a, b| a.name().cmp(b.name()));
    feeds
}

// ============================================================================
// COLLECTOR
// ============================================================================

/// Fetch every source concurrently, each under `timeout`. Returns the
/// concatenated items of the sources that succeeded.
pub async fn collect_all(sources: &[Arc<dyn FeedSource>], timeout: Duration) -> Vec<RawItem> {
    let mut handles = Vec::with_capacity(sources.len());
    for source in sources {
        let source = Arc::clone(source);
        let name = source.name().to_string();
        let handle = tokio::spawn(async move {
            let fetched =
                tokio::time::timeout(timeout, tokio::task::spawn_blocking(move || source.fetch()))
                    .await;
            (name, fetched)
        });
        handles.push(handle);
    }

    let mut items: Vec<RawItem> = Vec::new();
    for handle in handles {
        let Ok((name, fetched)) = handle.await else {
            continue;
        };
        match fetched {
            Ok(Ok(Ok(batch))) => {
                tracing::debug!(feed = %name, items = batch.len(), "feed fetched");
                items.extend(batch);
            }
            Ok(Ok(Err(e))) => tracing::warn!(feed = %name, error = %e, "feed failed, skipping"),
            Ok(Err(e)) => tracing::warn!(feed = %name, error = %e, "feed task panicked, skipping"),
            Err(_) => tracing::warn!(feed = %name, "feed timed out, skipping"),
        }
    }
    items
}

// ============================================================================
// TESTS
// ============================================================================
