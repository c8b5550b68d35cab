//! Enhanced risk scoring (phase 2)
//!
//! Builds on the base assessment with multi-source, government-confirmation
//! and combination bonuses, attaches badges, and re-tiers severity against
//! the stricter phase-2 thresholds.

use super::base::{has_active_exploitation_tag, has_poc_tag, has_tag, has_zero_day_tag};
use super::rules::*;
use crate::types::{Badge, MergedThreat, RiskAssessment, Severity};

/// Apply the phase-2 bonuses to a base assessment.
///
/// Bonuses are order-insensitive: each gate reads the base score or the
/// item, never the running total.
pub fn enhance(base: &RiskAssessment, threat: &MergedThreat, related_count: usize) -> RiskAssessment {
    let mut score = base.score;
    let mut evidence = base.evidence.clone();
    let mut badges: Vec<Badge> = Vec::new();

    if threat.source_count() >= MULTI_SOURCE_MIN {
        score += MULTI_SOURCE_BONUS;
        badges.push(Badge::MultiSource);
        evidence.push(format!(
            "Corroborated by {} independent sources",
            threat.source_count()
        ));
    }

    let gov_sources = threat
        .sources
        .iter()
        .filter(|s| {
            let lower = s.to_lowercase();
            GOV_ALLOWLIST.iter().any(|g| lower.contains(g))
        })
        .count();
    if gov_sources >= GOV_CONFIRMED_MIN {
        score += GOV_CONFIRMED_BONUS;
        badges.push(Badge::GovConfirmed);
        evidence.push(format!("Confirmed by {} government sources", gov_sources));
    }

    if has_tag(threat, "KEV") && has_zero_day_tag(threat) && has_active_exploitation_tag(threat) {
        score += CRITICAL_COMBO_BONUS;
        badges.push(Badge::CriticalCombo);
        evidence.push("KEV + zero-day + active exploitation".into());
    }

    if has_tag(threat, "ransomware")
        && has_poc_tag(threat)
        && base.score >= RANSOMWARE_CRITICAL_SCORE_MIN
    {
        score += RANSOMWARE_CRITICAL_BONUS;
        badges.push(Badge::RansomwareCritical);
        evidence.push("Critical ransomware with public exploit".into());
    }

    if related_count >= TRENDING_RELATED_MIN {
        score += TRENDING_BONUS;
        badges.push(Badge::Trending);
        evidence.push(format!("Trending: {} related reports", related_count));
    }

    if threat.tags.iter().any(|t| crate::extract::is_apt_tag(t)) {
        badges.push(Badge::AptTargeted);
    }

    let score = score.min(100);
    RiskAssessment {
        score,
        severity: enhanced_severity(score),
        evidence,
        badges,
    }
}

/// Severity from the phase-2 thresholds; monotonic in score.
pub fn enhanced_severity(score: u32) -> Severity {
    if score >= ENHANCED_CRITICAL_MIN {
        Severity::Critical
    } else if score >= ENHANCED_HIGH_MIN {
        Severity::High
    } else if score >= ENHANCED_MEDIUM_MIN {
        Severity::Medium
    } else if score >= ENHANCED_LOW_MIN {
        Severity::Low
    } else {
        Severity::Info
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::base::base_score;
    use crate::types::NormalizedItem;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn threat(source: &str, tags: &[&str], hours_ago: i64) -> MergedThreat {
        MergedThreat::from(NormalizedItem {
            id: Uuid::new_v4(),
            title: "advisory".into(),
            link: "https://example.test/a".into(),
            source: source.into(),
            description: String::new(),
            published: Utc::now() - Duration::hours(hours_ago),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        })
    }

    #[test]
    fn test_multi_source_and_gov_confirmed() {
        // 3 sources, 2 on the government allowlist.
        let mut t = threat("CISA KEV", &["CVE-2024-1"], 1000);
        t.sources = vec!["CISA KEV".into(), "US-CERT".into(), "VendorBlog".into()];
        let base = base_score(&t, Utc::now());
        let enhanced = enhance(&base, &t, 0);
        assert_eq!(enhanced.score, base.score + 10 + 15);
        assert!(enhanced.badges.contains(&Badge::MultiSource));
        assert!(enhanced.badges.contains(&Badge::GovConfirmed));
    }

    #[test]
    fn test_critical_combo() {
        let t = threat("x", &["KEV", "zero-day", "exploited"], 1000);
        let base = base_score(&t, Utc::now());
        let enhanced = enhance(&base, &t, 0);
        assert!(enhanced.badges.contains(&Badge::CriticalCombo));
        assert_eq!(enhanced.score, (base.score + 20).min(100));
    }

    #[test]
    fn test_ransomware_critical_requires_base_90() {
        let now = Utc::now();
        // ransomware + poc but a weak base score: no badge.
        let weak = threat("x", &["ransomware", "poc"], 1000);
        let weak_base = base_score(&weak, now);
        assert!(weak_base.score < 90);
        assert!(!enhance(&weak_base, &weak, 0)
            .badges
            .contains(&Badge::RansomwareCritical));

        // KEV + fresh + active exploitation pushes base to >= 90.
        let mut strong = threat("CISA KEV", &["KEV", "T1486", "ransomware", "poc"], 1);
        strong.primary.description = "actively exploited in the wild".into();
        let strong_base = base_score(&strong, now);
        assert!(strong_base.score >= 90);
        let enhanced = enhance(&strong_base, &strong, 0);
        assert!(enhanced.badges.contains(&Badge::RansomwareCritical));
    }

    #[test]
    fn test_trending_and_apt_badges() {
        let t = threat("x", &["APT28", "CVE-2024-1"], 1000);
        let base = base_score(&t, Utc::now());
        let enhanced = enhance(&base, &t, 3);
        assert!(enhanced.badges.contains(&Badge::Trending));
        assert!(enhanced.badges.contains(&Badge::AptTargeted));
        // APT-TARGETED itself adds no score
        assert_eq!(enhanced.score, (base.score + TRENDING_BONUS).min(100));
    }

    #[test]
    fn test_enhanced_severity_tiers() {
        assert_eq!(enhanced_severity(10), Severity::Info);
        assert_eq!(enhanced_severity(40), Severity::Low);
        assert_eq!(enhanced_severity(70), Severity::Medium);
        assert_eq!(enhanced_severity(85), Severity::High);
        assert_eq!(enhanced_severity(95), Severity::Critical);
        assert_eq!(enhanced_severity(100), Severity::Critical);
    }

    #[test]
    fn test_cap_at_100() {
        let mut t = threat("CISA KEV", &["KEV", "zero-day", "exploited", "ransomware", "poc", "T1486"], 1);
        t.primary.description = "actively exploited".into();
        t.sources = vec!["CISA KEV".into(), "US-CERT".into(), "NCSC".into()];
        let base = base_score(&t, Utc::now());
        let enhanced = enhance(&base, &t, 5);
        assert_eq!(enhanced.score, 100);
    }
}
