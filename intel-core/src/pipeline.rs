//! End-to-end pipeline orchestrator
//!
//! Runs one batch through every stage in order: normalize, dedup,
//! correlate, enrich, score, rank, and rolls the batch statistics. Pure
//! except for the injected clock, so a fixed `now` gives a fixed output.

use chrono::{DateTime, Utc};

use crate::enrich::{self, ItemSignals, ProfileSet};
use crate::types::{
    BatchStats, MergedThreat, RankedBatch, RawItem, Severity, ThreatRecord,
};
use crate::{correlate, dedup, normalize, rank, score};

/// The batch processor. Holds the reference profiles the enrichers match
/// against; everything else is per-call state.
pub struct Pipeline {
    profiles: ProfileSet,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(ProfileSet::builtin())
    }
}

impl Pipeline {
    pub fn new(profiles: ProfileSet) -> Self {
        Self { profiles }
    }

    pub fn profiles(&self) -> &ProfileSet {
        &self.profiles
    }

    /// Process one raw batch into a ranked batch.
    pub fn run(&self, raw: Vec<RawItem>, now: DateTime<Utc>) -> RankedBatch {
        let raw_count = raw.len();

        let normalized = normalize::normalize_batch(&raw, now);
        let merged = dedup::dedup_items(normalized);
        let unique_count = merged.len();
        tracing::debug!(
            raw = raw_count,
            unique = unique_count,
            "batch deduplicated"
        );

        let correlations = correlate::correlate_batch(&merged);

        let mut items: Vec<ThreatRecord> = merged
            .iter()
            .zip(correlations)
            .map(|(threat, correlation)| {
                let related_count = correlation.related.len();
                let risk = score::assess(threat, related_count, now);
                self.enrich_record(threat, correlation, risk)
            })
            .collect();

        rank::bubble_up_sort(&mut items);
        let stats = batch_stats(raw_count, unique_count, &items);
        tracing::info!(
            unique = stats.unique_count,
            merged = stats.duplicates_merged,
            correlated = stats.correlated_count,
            critical = stats.critical_count,
            "batch processed"
        );

        RankedBatch {
            updated: now,
            items,
            stats,
        }
    }

    /// Run the five enrichers and assemble the final record. An enricher
    /// with nothing to say contributes `None`, not an empty annotation.
    fn enrich_record(
        &self,
        threat: &MergedThreat,
        correlation: crate::types::CorrelationRecord,
        risk: crate::types::RiskAssessment,
    ) -> ThreatRecord {
        let signals = ItemSignals::from_threat(threat);

        let apt = enrich::apt::correlate(&signals, &self.profiles.apt_groups);
        let actors = enrich::actor::attribute(&signals, &self.profiles.actors);
        let dark_web = enrich::darkweb::correlate(
            &signals,
            &self.profiles.ransomware_victims,
            &self.profiles.pastes,
        );
        let detections = enrich::detection::recommend(&signals, &self.profiles.detection_rules);
        let geo = enrich::geopolitical::contextualize(&signals, &self.profiles.geo_profiles);

        ThreatRecord {
            id: threat.primary.id,
            title: threat.primary.title.clone(),
            link: threat.primary.link.clone(),
            source: threat.primary.source.clone(),
            description: threat.primary.description.clone(),
            published: threat.primary.published,
            tags: threat.tags.clone(),
            sources: threat.sources.clone(),
            source_count: threat.source_count(),
            alternate_links: threat.alternate_links.clone(),
            correlation,
            apt_attribution: some_if_nonempty(apt),
            actor_attribution: some_if_nonempty(actors),
            dark_web_intel: if dark_web.victims.is_empty() && dark_web.pastes.is_empty() {
                None
            } else {
                Some(dark_web)
            },
            recommended_detections: some_if_nonempty(detections),
            geopolitical_context: some_if_nonempty(geo),
            risk,
        }
    }
}

fn some_if_nonempty<T>(values: Vec<T>) -> Option<Vec<T>> {
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

fn batch_stats(raw_count: usize, unique_count: usize, items: &[ThreatRecord]) -> BatchStats {
    let mut stats = BatchStats {
        raw_count,
        unique_count,
        duplicates_merged: raw_count.saturating_sub(unique_count),
        ..BatchStats::default()
    };

    let mut score_sum = 0u64;
    for item in items {
        score_sum += item.risk.score as u64;
        if !item.correlation.related.is_empty() {
            stats.correlated_count += 1;
        }
        match item.risk.severity {
            Severity::Critical => stats.critical_count += 1,
            Severity::High => stats.high_count += 1,
            Severity::Medium => stats.medium_count += 1,
            Severity::Low => stats.low_count += 1,
            Severity::Info => stats.info_count += 1,
        }
    }
    if !items.is_empty() {
        stats.average_score = score_sum as f64 / items.len() as f64;
    }
    stats
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(title: &str, link: &str, source: &str, tags: &[&str]) -> RawItem {
        RawItem {
            title: title.into(),
            link: link.into(),
            source: source.into(),
            description: String::new(),
            published: Some(Utc::now()),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn test_empty_batch() {
        let batch = Pipeline::default().run(Vec::new(), Utc::now());
        assert!(batch.items.is_empty());
        assert_eq!(batch.stats.raw_count, 0);
        assert_eq!(batch.stats.average_score, 0.0);
    }

    #[test]
    fn test_duplicates_collapse_and_stats_add_up() {
        let items = vec![
            raw("Exchange zero-day report", "https://a/1", "s1", &["CVE-2024-1"]),
            raw("Exchange 0day report", "https://b/2", "s2", &["CVE-2024-1"]),
            raw("Unrelated phishing wave", "https://c/3", "s3", &["phishing"]),
        ];
        let batch = Pipeline::default().run(items, Utc::now());
        assert_eq!(batch.stats.raw_count, 3);
        assert_eq!(batch.stats.unique_count, 2);
        assert_eq!(batch.stats.duplicates_merged, 1);
        let severity_total = batch.stats.critical_count
            + batch.stats.high_count
            + batch.stats.medium_count
            + batch.stats.low_count
            + batch.stats.info_count;
        assert_eq!(severity_total, batch.items.len());
    }

    #[test]
    fn test_lowercase_identifier_tags_reach_the_scorer() {
        // Feeds that tag `cve-...`/`t####` in lowercase still earn the CVE
        // and MITRE evidence after normalization.
        let batch = Pipeline::default().run(
            vec![raw("vendor advisory", "https://a/1", "s1", &["cve-2024-9999", "t1566"])],
            Utc::now(),
        );
        let evidence = &batch.items[0].risk.evidence;
        assert!(evidence.iter().any(|e| e.contains("CVE identifier")));
        assert!(evidence.iter().any(|e| e.contains("MITRE ATT&CK")));
    }

    #[test]
    fn test_output_sorted_by_score() {
        let items = vec![
            raw("minor note", "https://a/1", "blog", &[]),
            raw("KEV actively exploited", "https://b/2", "CISA KEV", &["KEV", "T1566"]),
        ];
        let batch = Pipeline::default().run(items, Utc::now());
        for pair in batch.items.windows(2) {
            assert!(pair[0].risk.score >= pair[1].risk.score);
        }
        assert!(batch.items[0].title.contains("KEV"));
    }

    #[test]
    fn test_deterministic_for_fixed_now() {
        let now = Utc::now();
        let make = || {
            vec![
                raw("APT28 campaign uses T1566", "https://a/1", "s1", &["APT28"]),
                raw("LockBit hits MegaCorp Industries", "https://b/2", "s2", &["ransomware"]),
            ]
        };
        let a = Pipeline::default().run(make(), now);
        let b = Pipeline::default().run(make(), now);
        // ids are fresh per run; compare everything that should be stable
        assert_eq!(a.items.len(), b.items.len());
        for (x, y) in a.items.iter().zip(&b.items) {
            assert_eq!(x.title, y.title);
            assert_eq!(x.risk, y.risk);
            assert_eq!(x.correlation.correlation_id, y.correlation.correlation_id);
        }
        assert_eq!(a.stats, b.stats);
    }

    #[test]
    fn test_enrichment_fields_none_when_silent() {
        let batch = Pipeline::default().run(
            vec![raw("generic advisory", "https://a/1", "s1", &[])],
            Utc::now(),
        );
        let record = &batch.items[0];
        assert!(record.apt_attribution.is_none());
        assert!(record.actor_attribution.is_none());
        assert!(record.dark_web_intel.is_none());
        assert!(record.recommended_detections.is_none());
        assert!(record.geopolitical_context.is_none());
    }

    #[test]
    fn test_apt_enrichment_populated() {
        let batch = Pipeline::default().run(
            vec![raw(
                "APT28 phishing with Zebrocy",
                "https://a/1",
                "s1",
                &["T1566"],
            )],
            Utc::now(),
        );
        let record = &batch.items[0];
        let matches = record.apt_attribution.as_ref().unwrap();
        assert_eq!(matches[0].profile_id, "apt28");
    }
}
