//! Deduplicator: collapse exact and fuzzy duplicates into merged records
//!
//! Pairwise matching is a priority cascade - the first rule that matches
//! wins. Grouping is a greedy scan: an item joins the first existing group
//! containing any member it matches, otherwise it starts a new group. This
//! is deliberately not transitive-closure clustering.

use serde::Serialize;

use crate::extract::extract_indicators;
use crate::types::{MergedThreat, NormalizedItem};

// Cascade thresholds
const CVE_TITLE_SIMILARITY_MIN: f64 = 0.6;
const TITLE_SIMILARITY_MIN: f64 = 0.85;
const IOC_OVERLAP_MIN: f64 = 0.5;
const IOC_TITLE_SIMILARITY_MIN: f64 = 0.5;

// ============================================================================
// PAIRWISE MATCHING
// ============================================================================

/// How a pair of items was judged duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Url,
    Cve,
    Title,
    Ioc,
}

/// A positive duplicate verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateMatch {
    pub match_type: MatchType,
    pub confidence: f64,
}

/// Evaluate the duplicate cascade for a pair. Symmetric: the verdict, match
/// type and confidence are identical regardless of argument order.
///
/// Every rule reads only the primary item's fields (link, title, tags,
/// description), never the merged unions. A merged record therefore matches
/// exactly what its primary matched before the merge, which is what keeps
/// `dedup` idempotent over its own output.
pub fn duplicate_match(a: &MergedThreat, b: &MergedThreat) -> Option<DuplicateMatch> {
    // 1. Normalized URL equality
    let url_a = normalize_url(&a.primary.link);
    let url_b = normalize_url(&b.primary.link);
    if !url_a.is_empty() && url_a == url_b {
        return Some(DuplicateMatch {
            match_type: MatchType::Url,
            confidence: 1.0,
        });
    }

    let similarity = title_similarity(&a.primary.title, &b.primary.title);

    // 2. Shared CVE and moderately similar titles
    if shares_cve(a, b) && similarity >= CVE_TITLE_SIMILARITY_MIN {
        return Some(DuplicateMatch {
            match_type: MatchType::Cve,
            confidence: 0.95,
        });
    }

    // 3. Near-identical titles
    if similarity >= TITLE_SIMILARITY_MIN {
        return Some(DuplicateMatch {
            match_type: MatchType::Title,
            confidence: similarity,
        });
    }

    // 4. Shared extracted indicators with loosely similar titles
    if similarity >= IOC_TITLE_SIMILARITY_MIN && ioc_overlap(a, b) >= IOC_OVERLAP_MIN {
        return Some(DuplicateMatch {
            match_type: MatchType::Ioc,
            confidence: 0.75,
        });
    }

    None
}

fn shares_cve(a: &MergedThreat, b: &MergedThreat) -> bool {
    a.primary
        .tags
        .iter()
        .filter(|t| t.starts_with("CVE-"))
        .any(|t| b.primary.tags.iter().any(|u| u == t))
}

/// Overlap ratio of the extracted IP/domain/hash sets, measured against the
/// smaller set. Zero when either set is empty.
fn ioc_overlap(a: &MergedThreat, b: &MergedThreat) -> f64 {
    let set_a = extract_indicators(&item_text(a)).ioc_values();
    let set_b = extract_indicators(&item_text(b)).ioc_values();
    if set_a.is_empty() || set_b.is_empty() {
        return 0.0;
    }
    let shared = set_a.intersection(&set_b).count();
    shared as f64 / set_a.len().min(set_b.len()) as f64
}

fn item_text(item: &MergedThreat) -> String {
    format!("{} {}", item.primary.title, item.primary.description)
}

// ============================================================================
// SIMILARITY
// ============================================================================

/// Title similarity in [0, 1]: `1 - levenshtein / max(len)`, computed over
/// lowercased character sequences. Symmetric by construction; two empty
/// strings are identical.
pub fn title_similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();
    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - levenshtein_chars(&a, &b) as f64 / max_len as f64
}

/// Levenshtein edit distance over characters.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    levenshtein_chars(&a, &b)
}

fn levenshtein_chars(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Canonical URL form for equality checks: query string and fragment
/// stripped, then any trailing slash.
pub fn normalize_url(url: &str) -> String {
    let url = url.trim();
    let url = url.split('#').next().unwrap_or(url);
    let url = url.split('?').next().unwrap_or(url);
    url.trim_end_matches('/').to_string()
}

// ============================================================================
// GROUPING AND MERGE
// ============================================================================

/// Deduplicate a batch. Input order decides both the scan order and which
/// group an item joins. Matching reads primary fields only, so running the
/// output through `dedup` again changes nothing: an item that started its own
/// group matched no member of any earlier group, its primary included.
pub fn dedup(threats: Vec<MergedThreat>) -> Vec<MergedThreat> {
    let mut groups: Vec<Vec<MergedThreat>> = Vec::new();

    for threat in threats {
        let joined = groups.iter_mut().find(|group| {
            group
                .iter()
                .any(|member| duplicate_match(member, &threat).is_some())
        });
        match joined {
            Some(group) => group.push(threat),
            None => groups.push(vec![threat]),
        }
    }

    groups.into_iter().map(merge_group).collect()
}

/// Convenience wrapper: lift normalized items into singleton groups first.
pub fn dedup_items(items: Vec<NormalizedItem>) -> Vec<MergedThreat> {
    dedup(items.into_iter().map(MergedThreat::from).collect())
}

/// Merge one group: the primary is the member with the latest publish time
/// (first wins on ties); sources and tags are deduplicated unions; alternate
/// links are every distinct non-primary link.
fn merge_group(group: Vec<MergedThreat>) -> MergedThreat {
    let primary_idx = group
        .iter()
        .enumerate()
        .max_by(|(ia, a), (ib, b)| {
            a.primary
                .published
                .cmp(&b.primary.published)
                // max_by keeps the later element on Equal; prefer the earlier
                .then(ib.cmp(ia))
        })
        .map(|(i, _)| i)
        .unwrap_or(0);

    let primary = group[primary_idx].primary.clone();
    let mut sources: Vec<String> = Vec::new();
    let mut tags: Vec<String> = Vec::new();
    let mut alternate_links: Vec<String> = Vec::new();

    for member in &group {
        for source in &member.sources {
            if !sources.contains(source) {
                sources.push(source.clone());
            }
        }
        for tag in &member.tags {
            if !tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
                tags.push(tag.clone());
            }
        }
        for link in member
            .alternate_links
            .iter()
            .chain(std::iter::once(&member.primary.link))
        {
            if !link.is_empty() && *link != primary.link && !alternate_links.contains(link) {
                alternate_links.push(link.clone());
            }
        }
    }

    MergedThreat {
        primary,
        sources,
        tags,
        alternate_links,
    }
}

// ============================================================================
// TESTS
// ============================================================================
