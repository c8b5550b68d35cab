//! Normalizer: heterogeneous raw feed entries -> uniform item shape
//!
//! Malformed or missing fields are defaulted, never rejected; downstream
//! stages never branch on absence.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::extract::{canonical_tag, extract_cves, extract_techniques};
use crate::types::{NormalizedItem, RawItem};

/// Normalize one raw item.
///
/// Canonical tags are the original tags (trimmed, deduplicated, first
/// occurrence wins) plus uppercased CVE and MITRE technique ids found in the
/// title, description or raw tags. A missing publish time defaults to `now`
/// so a feed that omits dates still surfaces as fresh.
pub fn normalize(raw: &RawItem, now: DateTime<Utc>) -> NormalizedItem {
    let title = default_if_blank(&raw.title, "(untitled)");
    let source = default_if_blank(&raw.source, "unknown");
    let link = raw.link.trim().to_string();
    let description = raw.description.trim().to_string();

    // Raw tags are canonicalized before insertion: a feed that tags
    // `cve-2024-1234` must end up with `CVE-2024-1234`, not shadow it.
    let mut tags: Vec<String> = Vec::new();
    for tag in &raw.tags {
        push_unique(&mut tags, &canonical_tag(tag.trim()));
    }

    // CVE / technique ids can hide in free text or in oddly cased raw tags.
    let haystack = format!("{} {} {}", title, description, raw.tags.join(" "));
    for cve in extract_cves(&haystack) {
        push_unique(&mut tags, &cve);
    }
    for technique in extract_techniques(&haystack) {
        push_unique(&mut tags, &technique);
    }

    NormalizedItem {
        id: Uuid::new_v4(),
        title,
        link,
        source,
        description,
        published: raw.published.unwrap_or(now),
        tags,
    }
}

/// Normalize a whole batch, preserving input order.
pub fn normalize_batch(raw: &[RawItem], now: DateTime<Utc>) -> Vec<NormalizedItem> {
    raw.iter().map(|r| normalize(r, now)).collect()
}

fn default_if_blank(value: &str, default: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        default.to_string()
    } else {
        trimmed.to_string()
    }
}

fn push_unique(tags: &mut Vec<String>, tag: &str) {
    if tag.is_empty() {
        return;
    }
    if !tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
        tags.push(tag.to_string());
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(title: &str, description: &str, tags: &[&str]) -> RawItem {
        RawItem {
            title: title.into(),
            description: description.into(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_cve_uppercased_into_tags() {
        let item = normalize(&raw("patch cve-2024-1234", "", &[]), Utc::now());
        assert!(item.tags.contains(&"CVE-2024-1234".to_string()));
    }

    #[test]
    fn test_technique_from_description() {
        let item = normalize(&raw("phishing wave", "delivery via T1566.001", &[]), Utc::now());
        assert!(item.tags.contains(&"T1566.001".to_string()));
    }

    #[test]
    fn test_tag_from_raw_tags_not_duplicated() {
        let item = normalize(&raw("advisory", "", &["CVE-2024-1234", "ransomware"]), Utc::now());
        let cve_count = item.tags.iter().filter(|t| *t == "CVE-2024-1234").count();
        assert_eq!(cve_count, 1);
        assert!(item.tags.contains(&"ransomware".to_string()));
    }

    #[test]
    fn test_lowercase_identifier_tags_canonicalized() {
        // A lowercase raw tag must not shadow the uppercase canonical form.
        let item = normalize(&raw("advisory", "", &["cve-2024-1234", "t1566"]), Utc::now());
        assert!(item.tags.contains(&"CVE-2024-1234".to_string()));
        assert!(item.tags.contains(&"T1566".to_string()));
        assert!(!item.tags.iter().any(|t| t == "cve-2024-1234"));
        assert!(!item.tags.iter().any(|t| t == "t1566"));
    }

    #[test]
    fn test_defaults_applied() {
        let now = Utc::now();
        let item = normalize(&RawItem::default(), now);
        assert_eq!(item.title, "(untitled)");
        assert_eq!(item.source, "unknown");
        assert_eq!(item.published, now);
        assert!(item.tags.is_empty());
    }

    #[test]
    fn test_never_mutates_input_shape() {
        let input = raw("  padded title  ", "  desc  ", &["  x  ", ""]);
        let item = normalize(&input, Utc::now());
        assert_eq!(item.title, "padded title");
        assert_eq!(item.description, "desc");
        assert_eq!(item.tags, vec!["x".to_string()]);
    }
}
