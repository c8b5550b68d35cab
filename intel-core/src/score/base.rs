//! Base risk scoring
//!
//! Additive buckets with per-bucket caps and first-match-only chains, then a
//! source-credibility multiplier. Deterministic for a fixed `now`.

use chrono::{DateTime, Utc};

use super::rules::*;
use crate::extract::is_apt_tag;
use crate::types::{MergedThreat, RiskAssessment, Severity};

/// Compute the base risk assessment for one merged threat.
pub fn base_score(threat: &MergedThreat, now: DateTime<Utc>) -> RiskAssessment {
    let mut score = 0u32;
    let mut evidence: Vec<String> = Vec::new();
    let text = format!("{} {}", threat.primary.title, threat.primary.description).to_lowercase();

    // Indicator chain, first match wins
    if has_tag(threat, "KEV") {
        score += KEV_SCORE;
        evidence.push("Listed as a known exploited vulnerability (KEV)".into());
    } else if has_zero_day_tag(threat) {
        score += ZERO_DAY_SCORE;
        evidence.push("Zero-day vulnerability".into());
    } else if has_cve_tag(threat) {
        score += CVE_SCORE;
        evidence.push("CVE identifier assigned".into());
    }

    // Independent of the chain above
    if threat.tags.iter().any(|t| is_technique_tag(t)) {
        score += MITRE_SCORE;
        evidence.push("Mapped to MITRE ATT&CK technique(s)".into());
    }

    // Exploitability, first match wins
    if let Some(pattern) = first_pattern(&text, ACTIVE_EXPLOITATION_PATTERNS) {
        score += ACTIVE_EXPLOITATION_SCORE;
        evidence.push(format!("Active exploitation reported (\"{}\")", pattern));
    } else if let Some(kit) = first_pattern(&text, EXPLOIT_KIT_NAMES) {
        score += EXPLOIT_KIT_SCORE;
        evidence.push(format!("Exploit tooling referenced (\"{}\")", kit));
    } else if first_pattern(&text, POC_PATTERNS).is_some() {
        score += POC_SCORE;
        evidence.push("Proof-of-concept available".into());
    }

    // Temporal
    let age_hours = now
        .signed_duration_since(threat.primary.published)
        .num_hours();
    if age_hours <= 24 {
        score += FRESH_24H_SCORE;
        evidence.push("Published within 24 hours".into());
    } else if age_hours <= 24 * 7 {
        score += FRESH_7D_SCORE;
        evidence.push("Published within 7 days".into());
    } else if age_hours <= 24 * 30 {
        score += FRESH_30D_SCORE;
        evidence.push("Published within 30 days".into());
    } else {
        score += STALE_SCORE;
    }

    // Threat type, priority order
    if has_tag(threat, "ransomware") {
        score += RANSOMWARE_SCORE;
        evidence.push("Ransomware activity".into());
    } else if has_apt_type_tag(threat) {
        score += APT_SCORE;
        evidence.push("APT activity".into());
    } else if has_tag(threat, "malware") {
        score += MALWARE_SCORE;
        evidence.push("Malware activity".into());
    } else if has_tag(threat, "exploit") {
        score += EXPLOIT_SCORE;
        evidence.push("Exploit activity".into());
    } else if has_tag(threat, "phishing") {
        score += PHISHING_SCORE;
        evidence.push("Phishing activity".into());
    }

    // Source credibility multiplier over the summed buckets
    let (multiplier, tier) = source_multiplier(&threat.primary.source);
    if (multiplier - 1.0).abs() > f64::EPSILON {
        evidence.push(format!("Source credibility x{} ({})", multiplier, tier));
    }
    let score = ((score as f64 * multiplier).round() as u32).min(100);

    RiskAssessment {
        score,
        severity: base_severity(score),
        evidence,
        badges: Vec::new(),
    }
}

/// Severity from the base-phase thresholds; monotonic in score.
pub fn base_severity(score: u32) -> Severity {
    if score >= BASE_CRITICAL_MIN {
        Severity::Critical
    } else if score >= BASE_HIGH_MIN {
        Severity::High
    } else if score >= BASE_MEDIUM_MIN {
        Severity::Medium
    } else {
        Severity::Low
    }
}

/// Credibility multiplier from the fixed source tier table.
pub fn source_multiplier(source: &str) -> (f64, &'static str) {
    let lower = source.to_lowercase();
    if GOV_SOURCE_KEYWORDS.iter().any(|k| lower.contains(k)) {
        (GOV_MULTIPLIER, "government")
    } else if VENDOR_SOURCE_KEYWORDS.iter().any(|k| lower.contains(k)) {
        (VENDOR_MULTIPLIER, "vendor")
    } else if NEWS_SOURCE_KEYWORDS.iter().any(|k| lower.contains(k)) {
        (NEWS_MULTIPLIER, "news")
    } else {
        (UNKNOWN_MULTIPLIER, "unknown")
    }
}

// ============================================================================
// TAG HELPERS (shared with the enhanced scorer)
// ============================================================================

pub(crate) fn has_tag(threat: &MergedThreat, tag: &str) -> bool {
    threat.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
}

pub(crate) fn has_cve_tag(threat: &MergedThreat) -> bool {
    threat.tags.iter().any(|t| t.starts_with("CVE-"))
}

pub(crate) fn has_zero_day_tag(threat: &MergedThreat) -> bool {
    ["zero-day", "zeroday", "0-day", "0day"]
        .iter()
        .any(|z| has_tag(threat, z))
}

pub(crate) fn has_active_exploitation_tag(threat: &MergedThreat) -> bool {
    ["exploited", "actively-exploited", "active-exploitation", "in-the-wild"]
        .iter()
        .any(|t| has_tag(threat, t))
}

pub(crate) fn has_poc_tag(threat: &MergedThreat) -> bool {
    ["poc", "proof-of-concept"].iter().any(|t| has_tag(threat, t))
}

pub(crate) fn has_apt_type_tag(threat: &MergedThreat) -> bool {
    threat
        .tags
        .iter()
        .any(|t| t.eq_ignore_ascii_case("apt") || is_apt_tag(t))
}

fn is_technique_tag(tag: &str) -> bool {
    if !tag.is_ascii() || !(tag.len() == 5 || tag.len() == 9) || !tag.starts_with('T') {
        return false;
    }
    let (id, sub) = tag.split_at(5);
    id[1..].chars().all(|c| c.is_ascii_digit())
        && (sub.is_empty()
            || (sub.starts_with('.') && sub[1..].chars().all(|c| c.is_ascii_digit())))
}

fn first_pattern<'a>(text: &str, patterns: &[&'a str]) -> Option<&'a str> {
    patterns.iter().find(|p| text.contains(*p)).copied()
}

// ============================================================================
// TESTS
// ============================================================================
