//! Correlator: stable correlation ids and cross-item relation scoring

use chrono::Duration;
use sha2::{Digest, Sha256};

use crate::extract::is_apt_tag;
use crate::types::{CorrelationRecord, MergedThreat, RelatedThreatRef};

// Relation weights
const SHARED_CVE_SCORE: u32 = 50;
const SHARED_TAGS_SCORE: u32 = 20;
const SHARED_TAGS_MIN: usize = 3;
const SHARED_APT_SCORE: u32 = 30;
const TEMPORAL_SCORE: u32 = 10;
const TEMPORAL_WINDOW_HOURS: i64 = 24;
const RELATED_MIN_SCORE: u32 = 30;
const RELATED_MAX: usize = 5;

// ============================================================================
// CORRELATION ID
// ============================================================================

/// Derive a stable correlation id for an item.
///
/// Preference order: CVE tags (sorted, joined), else the link's host+path,
/// else a truncated hash of the lowercased title. The same story therefore
/// lands on the same id across cycles regardless of item identity.
pub fn correlation_id(item: &MergedThreat) -> String {
    let mut cves: Vec<&str> = item
        .tags
        .iter()
        .filter(|t| t.starts_with("CVE-"))
        .map(|t| t.as_str())
        .collect();
    if !cves.is_empty() {
        cves.sort_unstable();
        return format!("cve:{}", cves.join(","));
    }

    if !item.primary.link.trim().is_empty() {
        return format!("url:{}", host_and_path(&item.primary.link));
    }

    let digest = Sha256::digest(item.primary.title.to_lowercase().as_bytes());
    format!("title:{}", &hex::encode(digest)[..16])
}

/// Host plus path, with scheme, query, fragment and trailing slash removed.
fn host_and_path(link: &str) -> String {
    let rest = link
        .trim()
        .strip_prefix("https://")
        .or_else(|| link.trim().strip_prefix("http://"))
        .unwrap_or_else(|| link.trim());
    let rest = rest.split('#').next().unwrap_or(rest);
    let rest = rest.split('?').next().unwrap_or(rest);
    rest.trim_end_matches('/').to_string()
}

// ============================================================================
// RELATED THREATS
// ============================================================================

/// Find the strongest relations between `item` and the rest of the batch.
///
/// Candidates whose sources are all already among the item's sources are
/// skipped - they add no independent reporting. Relations below
/// `RELATED_MIN_SCORE` are dropped; the rest are sorted descending and
/// truncated to `RELATED_MAX`. Note the relation is not guaranteed symmetric:
/// the temporal bonus only applies on top of an existing signal.
pub fn find_related(item: &MergedThreat, all: &[MergedThreat]) -> Vec<RelatedThreatRef> {
    let mut related: Vec<RelatedThreatRef> = Vec::new();

    for candidate in all {
        if candidate.primary.id == item.primary.id {
            continue;
        }
        if candidate
            .sources
            .iter()
            .all(|s| item.sources.contains(s))
        {
            continue;
        }

        let mut score = 0u32;
        let mut reasons: Vec<String> = Vec::new();

        let shared_cves = shared_cve_count(item, candidate);
        if shared_cves > 0 {
            score += SHARED_CVE_SCORE * shared_cves as u32;
            reasons.push(format!("Shares {} CVE identifier(s)", shared_cves));
        }

        let shared_tags = shared_non_cve_tag_count(item, candidate);
        if shared_tags >= SHARED_TAGS_MIN {
            score += SHARED_TAGS_SCORE;
            reasons.push(format!("Shares {} tags", shared_tags));
        }

        if shares_apt_tag(item, candidate) {
            score += SHARED_APT_SCORE;
            reasons.push("Shares an APT group tag".to_string());
        }

        let gap = item
            .primary
            .published
            .signed_duration_since(candidate.primary.published);
        if score > 0 && gap.abs() <= Duration::hours(TEMPORAL_WINDOW_HOURS) {
            score += TEMPORAL_SCORE;
            reasons.push("Published within 24 hours".to_string());
        }

        if score >= RELATED_MIN_SCORE {
            related.push(RelatedThreatRef {
                link: candidate.primary.link.clone(),
                title: candidate.primary.title.clone(),
                source: candidate.primary.source.clone(),
                relation_score: score,
                reasons,
            });
        }
    }

    related.sort_by(|a, b| b.relation_score.cmp(&a.relation_score));
    related.truncate(RELATED_MAX);
    related
}

/// Correlate every item in the batch against every other.
pub fn correlate_batch(threats: &[MergedThreat]) -> Vec<CorrelationRecord> {
    threats
        .iter()
        .map(|item| CorrelationRecord {
            correlation_id: correlation_id(item),
            related: find_related(item, threats),
        })
        .collect()
}

fn shared_cve_count(a: &MergedThreat, b: &MergedThreat) -> usize {
    a.tags
        .iter()
        .filter(|t| t.starts_with("CVE-"))
        .filter(|t| b.tags.iter().any(|u| u == *t))
        .count()
}

fn shared_non_cve_tag_count(a: &MergedThreat, b: &MergedThreat) -> usize {
    a.tags
        .iter()
        .filter(|t| !t.starts_with("CVE-"))
        .filter(|t| b.tags.iter().any(|u| u.eq_ignore_ascii_case(t)))
        .count()
}

fn shares_apt_tag(a: &MergedThreat, b: &MergedThreat) -> bool {
    a.tags
        .iter()
        .filter(|t| is_apt_tag(t))
        .any(|t| b.tags.iter().any(|u| u.eq_ignore_ascii_case(t)))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NormalizedItem;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn threat(title: &str, link: &str, source: &str, tags: &[&str], hours_ago: i64) -> MergedThreat {
        MergedThreat::from(NormalizedItem {
            id: Uuid::new_v4(),
            title: title.into(),
            link: link.into(),
            source: source.into(),
            description: String::new(),
            published: Utc::now() - Duration::hours(hours_ago),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        })
    }

    #[test]
    fn test_correlation_id_prefers_cves_sorted() {
        let t = threat("x", "https://a/1", "s", &["CVE-2024-0002", "CVE-2024-0001"], 1);
        assert_eq!(correlation_id(&t), "cve:CVE-2024-0001,CVE-2024-0002");
    }

    #[test]
    fn test_correlation_id_falls_back_to_url() {
        let t = threat("x", "https://feed.example/a/b/?ref=rss", "s", &["malware"], 1);
        assert_eq!(correlation_id(&t), "url:feed.example/a/b");
    }

    #[test]
    fn test_correlation_id_title_hash_is_stable() {
        let a = threat("Same Headline", "", "s1", &[], 1);
        let b = threat("same headline", "", "s2", &[], 5);
        let id_a = correlation_id(&a);
        assert!(id_a.starts_with("title:"));
        assert_eq!(id_a, correlation_id(&b));
    }

    #[test]
    fn test_shared_cve_scores_fifty_each() {
        let a = threat("a", "https://a/1", "s1", &["CVE-2024-1", "CVE-2024-2"], 1);
        let b = threat("b", "https://b/2", "s2", &["CVE-2024-1", "CVE-2024-2"], 100);
        let related = find_related(&a, &[a.clone(), b]);
        assert_eq!(related.len(), 1);
        // 2 shared CVEs, no temporal bonus (100h apart)
        assert_eq!(related[0].relation_score, 100);
    }

    #[test]
    fn test_temporal_bonus_requires_prior_signal() {
        // Same window but nothing shared: no bonus, no relation.
        let a = threat("a", "https://a/1", "s1", &["x"], 1);
        let b = threat("b", "https://b/2", "s2", &["y"], 2);
        assert!(find_related(&a, &[a.clone(), b]).is_empty());

        // Shared CVE within the window picks up the extra 10.
        let c = threat("c", "https://c/3", "s3", &["CVE-2024-9"], 1);
        let d = threat("d", "https://d/4", "s4", &["CVE-2024-9"], 2);
        let related = find_related(&c, &[c.clone(), d]);
        assert_eq!(related[0].relation_score, 60);
        assert!(related[0]
            .reasons
            .iter()
            .any(|r| r.contains("24 hours")));
    }

    #[test]
    fn test_fully_overlapping_sources_skipped() {
        let a = threat("a", "https://a/1", "shared-source", &["CVE-2024-1"], 1);
        let b = threat("b", "https://b/2", "shared-source", &["CVE-2024-1"], 2);
        assert!(find_related(&a, &[a.clone(), b]).is_empty());
    }

    #[test]
    fn test_related_capped_at_five() {
        let base = threat("base", "https://base/0", "s0", &["CVE-2024-7"], 1);
        let mut all = vec![base.clone()];
        for i in 0..8 {
            all.push(threat(
                &format!("other {}", i),
                &format!("https://o/{}", i),
                &format!("s{}", i + 1),
                &["CVE-2024-7"],
                2,
            ));
        }
        let related = find_related(&base, &all);
        assert_eq!(related.len(), 5);
        // Descending by score
        for pair in related.windows(2) {
            assert!(pair[0].relation_score >= pair[1].relation_score);
        }
    }

    #[test]
    fn test_apt_tag_bonus() {
        let a = threat("a", "https://a/1", "s1", &["APT28", "CVE-2024-1"], 1);
        let b = threat("b", "https://b/2", "s2", &["apt28", "CVE-2024-1"], 2);
        let related = find_related(&a, &[a.clone(), b]);
        // 50 (cve) + 30 (apt) + 10 (temporal) = 90
        assert_eq!(related[0].relation_score, 90);
    }
}
