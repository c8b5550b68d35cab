//! Typed indicator extraction from free text
//!
//! One extractor shared by the deduplicator, correlator and all five
//! attribution enrichers. Returns typed sets rather than ad hoc arrays so
//! callers never re-parse text.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

// ============================================================================
// PATTERNS
// ============================================================================

static CVE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bCVE-\d{4}-\d{4,}\b").unwrap());

static TECHNIQUE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bT\d{4}(?:\.\d{3})?\b").unwrap());

static IPV4_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:\d{1,3}\.){3}\d{1,3}\b").unwrap());

static DOMAIN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b[a-z0-9][a-z0-9-]*(?:\.[a-z0-9][a-z0-9-]*)*\.[a-z]{2,}\b").unwrap()
});

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap());

static HASH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[a-fA-F0-9]{32}\b|\b[a-fA-F0-9]{40}\b|\b[a-fA-F0-9]{64}\b").unwrap());

static APT_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^APT\d+$").unwrap());

static CVE_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^CVE-\d{4}-\d{4,}$").unwrap());

static TECHNIQUE_TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^T\d{4}(?:\.\d{3})?$").unwrap());

// ============================================================================
// TYPED SETS
// ============================================================================

/// Hash kind, classified by hex length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HashKind {
    Md5,
    Sha1,
    Sha256,
}

impl HashKind {
    pub fn from_len(len: usize) -> Option<Self> {
        match len {
            32 => Some(HashKind::Md5),
            40 => Some(HashKind::Sha1),
            64 => Some(HashKind::Sha256),
            _ => None,
        }
    }
}

/// All typed indicators found in one piece of text.
///
/// BTreeSet fields keep iteration order deterministic across runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorSet {
    pub cves: BTreeSet<String>,
    pub techniques: BTreeSet<String>,
    pub ips: BTreeSet<String>,
    pub domains: BTreeSet<String>,
    pub emails: BTreeSet<String>,
    pub hashes: BTreeSet<(HashKind, String)>,
}

impl IndicatorSet {
    pub fn is_empty(&self) -> bool {
        self.cves.is_empty()
            && self.techniques.is_empty()
            && self.ips.is_empty()
            && self.domains.is_empty()
            && self.emails.is_empty()
            && self.hashes.is_empty()
    }

    /// IP + domain + hash values, the set used for fuzzy duplicate matching.
    pub fn ioc_values(&self) -> BTreeSet<String> {
        let mut out: BTreeSet<String> = BTreeSet::new();
        out.extend(self.ips.iter().cloned());
        out.extend(self.domains.iter().cloned());
        out.extend(self.hashes.iter().map(|(_, h)| h.clone()));
        out
    }
}

// ============================================================================
// EXTRACTORS
// ============================================================================

/// Extract CVE identifiers, uppercased.
pub fn extract_cves(text: &str) -> BTreeSet<String> {
    CVE_RE
        .find_iter(text)
        .map(|m| m.as_str().to_uppercase())
        .collect()
}

/// Extract MITRE ATT&CK technique identifiers (`T####` or `T####.###`),
/// uppercased.
pub fn extract_techniques(text: &str) -> BTreeSet<String> {
    TECHNIQUE_RE
        .find_iter(text)
        .map(|m| m.as_str().to_uppercase())
        .collect()
}

/// Extract every typed indicator from free text.
pub fn extract_indicators(text: &str) -> IndicatorSet {
    let mut set = IndicatorSet {
        cves: extract_cves(text),
        techniques: extract_techniques(text),
        ..Default::default()
    };

    for m in IPV4_RE.find_iter(text) {
        if is_valid_ipv4(m.as_str()) {
            set.ips.insert(m.as_str().to_string());
        }
    }

    for m in EMAIL_RE.find_iter(text) {
        set.emails.insert(m.as_str().to_lowercase());
    }

    for m in HASH_RE.find_iter(text) {
        let value = m.as_str().to_lowercase();
        if let Some(kind) = HashKind::from_len(value.len()) {
            set.hashes.insert((kind, value));
        }
    }

    for m in DOMAIN_RE.find_iter(text) {
        let value = m.as_str().to_lowercase();
        // IPs and CVE-like fragments also match the hostname shape
        if set.ips.contains(&value) || value.starts_with("cve-") {
            continue;
        }
        if set.emails.iter().any(|e| e.ends_with(&value)) {
            continue;
        }
        set.domains.insert(value);
    }

    set
}

/// Which of `keywords` appear in `text` (case-insensitive substring match).
/// Returns the keywords as given, in their original order.
pub fn match_keywords<'a>(text: &str, keywords: &'a [String]) -> Vec<&'a str> {
    let lower = text.to_lowercase();
    keywords
        .iter()
        .filter(|k| !k.is_empty() && lower.contains(&k.to_lowercase()))
        .map(|k| k.as_str())
        .collect()
}

/// Is this tag an APT group name (`APT` followed by digits)?
pub fn is_apt_tag(tag: &str) -> bool {
    APT_TAG_RE.is_match(tag)
}

/// Canonical form of a raw tag: CVE- and technique-shaped tags are
/// uppercased so downstream prefix checks (`CVE-`, `T####`) always hit;
/// everything else passes through unchanged.
pub fn canonical_tag(tag: &str) -> String {
    if CVE_TAG_RE.is_match(tag) || TECHNIQUE_TAG_RE.is_match(tag) {
        tag.to_uppercase()
    } else {
        tag.to_string()
    }
}

fn is_valid_ipv4(s: &str) -> bool {
    s.split('.')
        .filter_map(|octet| octet.parse::<u32>().ok())
        .filter(|n| *n <= 255)
        .count()
        == 4
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_cves_uppercases() {
        let cves = extract_cves("patch cve-2024-1234 and CVE-2023-44487 now");
        assert!(cves.contains("CVE-2024-1234"));
        assert!(cves.contains("CVE-2023-44487"));
        assert_eq!(cves.len(), 2);
    }

    #[test]
    fn test_extract_techniques() {
        let t = extract_techniques("uses T1566.001 and t1059 for execution");
        assert!(t.contains("T1566.001"));
        assert!(t.contains("T1059"));
    }

    #[test]
    fn test_extract_ips_rejects_out_of_range() {
        let set = extract_indicators("c2 at 192.168.1.50 and bogus 999.1.1.1");
        assert!(set.ips.contains("192.168.1.50"));
        assert!(!set.ips.contains("999.1.1.1"));
    }

    #[test]
    fn test_hash_classification() {
        let set = extract_indicators(concat!(
            "md5 d41d8cd98f00b204e9800998ecf8427e ",
            "sha256 e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        ));
        assert!(set
            .hashes
            .contains(&(HashKind::Md5, "d41d8cd98f00b204e9800998ecf8427e".into())));
        assert!(set.hashes.iter().any(|(k, _)| *k == HashKind::Sha256));
    }

    #[test]
    fn test_domains_exclude_ips_and_emails() {
        let set = extract_indicators("see evil-domain.com, 10.0.0.1, admin@corp.example.org");
        assert!(set.domains.contains("evil-domain.com"));
        assert!(set.emails.contains("admin@corp.example.org"));
        assert!(!set.domains.iter().any(|d| d == "10.0.0.1"));
    }

    #[test]
    fn test_match_keywords() {
        let kws = vec!["Emotet".to_string(), "TrickBot".to_string()];
        let hits = match_keywords("new EMOTET campaign observed", &kws);
        assert_eq!(hits, vec!["Emotet"]);
    }

    #[test]
    fn test_canonical_tag_uppercases_identifier_shapes() {
        assert_eq!(canonical_tag("cve-2024-1234"), "CVE-2024-1234");
        assert_eq!(canonical_tag("t1566.001"), "T1566.001");
        assert_eq!(canonical_tag("t1059"), "T1059");
        // Non-identifier tags keep their casing.
        assert_eq!(canonical_tag("LockBit"), "LockBit");
        assert_eq!(canonical_tag("ransomware"), "ransomware");
    }

    #[test]
    fn test_is_apt_tag() {
        assert!(is_apt_tag("APT28"));
        assert!(is_apt_tag("apt41"));
        assert!(!is_apt_tag("APT"));
        assert!(!is_apt_tag("APT28-related"));
    }
}
