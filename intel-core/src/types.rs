//! Core data models for the threat intelligence pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// FEED ITEMS
// ============================================================================

/// A raw entry as delivered by a feed source.
///
/// Produced by the collection layer; immutable once received. Every field
/// except `title` may be missing - the normalizer fills explicit defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RawItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub published: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A raw item after normalization: canonical tag set, no absent fields.
///
/// Created once per `RawItem` and never mutated afterwards; later stages
/// extend it by copy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizedItem {
    pub id: Uuid,
    pub title: String,
    pub link: String,
    pub source: String,
    pub description: String,
    pub published: DateTime<Utc>,
    /// Original tags plus uppercased CVE ids and MITRE technique ids
    /// extracted from title, description and raw tags.
    pub tags: Vec<String>,
}

// ============================================================================
// DEDUPLICATION
// ============================================================================

/// A deduplicated threat: one primary item plus merge metadata for the
/// duplicates that were collapsed into it.
///
/// Invariants: `sources` is a deduplicated union (`source_count()` is its
/// length) and `alternate_links` never contains the primary link.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MergedThreat {
    pub primary: NormalizedItem,
    /// All distinct source names across the group, in scan order.
    pub sources: Vec<String>,
    /// Union of the group members' tag sets.
    pub tags: Vec<String>,
    /// All distinct non-primary links across the group.
    pub alternate_links: Vec<String>,
}

impl MergedThreat {
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }
}

impl From<NormalizedItem> for MergedThreat {
    /// Lift a single item into a singleton group.
    fn from(item: NormalizedItem) -> Self {
        let sources = vec![item.source.clone()];
        let tags = item.tags.clone();
        Self {
            primary: item,
            sources,
            tags,
            alternate_links: Vec::new(),
        }
    }
}

// ============================================================================
// CORRELATION
// ============================================================================

/// A reference to another item in the batch that relates to this one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelatedThreatRef {
    pub link: String,
    pub title: String,
    pub source: String,
    pub relation_score: u32,
    pub reasons: Vec<String>,
}

/// Stable correlation id plus the strongest cross-item links (at most 5,
/// descending by relation score).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CorrelationRecord {
    pub correlation_id: String,
    pub related: Vec<RelatedThreatRef>,
}

// ============================================================================
// ATTRIBUTION
// ============================================================================

/// One reference profile that cleared its enricher's confidence threshold.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttributionMatch {
    pub profile_id: String,
    pub profile_name: String,
    /// 0-100
    pub confidence: u8,
    pub matched_indicators: Vec<String>,
}

/// Dark-web annotations: ransomware victim-list hits and paste/IOC hits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DarkWebIntel {
    pub victims: Vec<AttributionMatch>,
    pub pastes: Vec<AttributionMatch>,
}

/// A detection rule recommended because it covers the item's techniques.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendedDetection {
    pub rule_id: String,
    pub rule_name: String,
    /// 0-100
    pub confidence: u8,
    pub matched_techniques: Vec<String>,
    /// matched techniques / item techniques, as a percentage
    pub coverage: u8,
}

// ============================================================================
// RISK
// ============================================================================

/// Severity tiers, most severe first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
            Severity::Info => "INFO",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Short enumerated codes summarizing why an item scored as it did.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Badge {
    #[serde(rename = "MULTI-SOURCE")]
    MultiSource,
    #[serde(rename = "GOV-CONFIRMED")]
    GovConfirmed,
    #[serde(rename = "CRITICAL-COMBO")]
    CriticalCombo,
    #[serde(rename = "RANSOMWARE-CRITICAL")]
    RansomwareCritical,
    #[serde(rename = "TRENDING")]
    Trending,
    #[serde(rename = "APT-TARGETED")]
    AptTargeted,
}

impl Badge {
    pub fn as_str(&self) -> &'static str {
        match self {
            Badge::MultiSource => "MULTI-SOURCE",
            Badge::GovConfirmed => "GOV-CONFIRMED",
            Badge::CriticalCombo => "CRITICAL-COMBO",
            Badge::RansomwareCritical => "RANSOMWARE-CRITICAL",
            Badge::Trending => "TRENDING",
            Badge::AptTargeted => "APT-TARGETED",
        }
    }
}

/// Deterministic risk assessment for one item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskAssessment {
    /// 0-100, integer
    pub score: u32,
    pub severity: Severity,
    /// Human-readable reasons for each scoring rule that fired.
    pub evidence: Vec<String>,
    pub badges: Vec<Badge>,
}

// ============================================================================
// FINAL RECORDS
// ============================================================================

/// One fully processed item: merge metadata, correlation, attribution
/// annotations and risk assessment, ready for ranking and serving.
///
/// Each enricher contributes an explicit optional field, so a record shows
/// statically which enrichers ran against it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThreatRecord {
    pub id: Uuid,
    pub title: String,
    pub link: String,
    pub source: String,
    pub description: String,
    pub published: DateTime<Utc>,
    pub tags: Vec<String>,
    pub sources: Vec<String>,
    pub source_count: usize,
    pub alternate_links: Vec<String>,
    pub correlation: CorrelationRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apt_attribution: Option<Vec<AttributionMatch>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_attribution: Option<Vec<AttributionMatch>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dark_web_intel: Option<DarkWebIntel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended_detections: Option<Vec<RecommendedDetection>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geopolitical_context: Option<Vec<AttributionMatch>>,
    pub risk: RiskAssessment,
}

/// Batch-level statistics, computed once per processing cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct BatchStats {
    pub raw_count: usize,
    pub unique_count: usize,
    pub duplicates_merged: usize,
    /// Items with at least one related threat.
    pub correlated_count: usize,
    pub average_score: f64,
    pub critical_count: usize,
    pub high_count: usize,
    pub medium_count: usize,
    pub low_count: usize,
    pub info_count: usize,
}

/// The output of one full processing cycle: ranked records plus stats.
///
/// Built once per cycle, written wholesale to the cache, superseded by the
/// next cycle's batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedBatch {
    pub updated: DateTime<Utc>,
    pub items: Vec<ThreatRecord>,
    pub stats: BatchStats,
}
