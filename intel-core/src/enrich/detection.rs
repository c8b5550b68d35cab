//! Detection-rule recommendation enricher
//!
//! Recommends detection rules whose ATT&CK technique coverage intersects the
//! item's techniques. Confidence accumulates per matched technique, weighted
//! by the rule's detection severity, plus a small bonus for rule maturity.

use super::profiles::{DetectionRule, DetectionSeverity};
use super::{clamp_confidence, ItemSignals};
use crate::types::RecommendedDetection;

const CRITICAL_TECHNIQUE_SCORE: u32 = 10;
const HIGH_TECHNIQUE_SCORE: u32 = 7;
const MEDIUM_TECHNIQUE_SCORE: u32 = 5;
const OTHER_TECHNIQUE_SCORE: u32 = 3;
const STABLE_BONUS: u32 = 5;
const PREVIEW_BONUS: u32 = 3;
const TOP_N: usize = 5;

/// Recommend rules for one item. Rules with no technique overlap are
/// skipped; the rest are sorted by confidence descending and truncated.
pub fn recommend(signals: &ItemSignals, rules: &[DetectionRule]) -> Vec<RecommendedDetection> {
    let total = signals.techniques.len();
    if total == 0 {
        return Vec::new();
    }

    let mut out: Vec<RecommendedDetection> = rules
        .iter()
        .filter_map(|rule| {
            let matched: Vec<String> = rule
                .techniques
                .iter()
                .filter(|t| {
                    signals
                        .techniques
                        .iter()
                        .any(|have| have.eq_ignore_ascii_case(t))
                })
                .map(|t| t.to_uppercase())
                .collect();
            if matched.is_empty() {
                return None;
            }

            let per_technique = match rule.severity {
                DetectionSeverity::Critical => CRITICAL_TECHNIQUE_SCORE,
                DetectionSeverity::High => HIGH_TECHNIQUE_SCORE,
                DetectionSeverity::Medium => MEDIUM_TECHNIQUE_SCORE,
                DetectionSeverity::Low => OTHER_TECHNIQUE_SCORE,
            };
            let mut score = per_technique * matched.len() as u32;
            match rule.status.as_str() {
                "stable" => score += STABLE_BONUS,
                "preview" => score += PREVIEW_BONUS,
                _ => {}
            }

            let coverage = (matched.len() as f64 / total as f64 * 100.0).round() as u8;

            Some(RecommendedDetection {
                rule_id: rule.id.clone(),
                rule_name: rule.name.clone(),
                confidence: clamp_confidence(score),
                matched_techniques: matched,
                coverage,
            })
        })
        .collect();

    out.sort_by(|a, b| b.confidence.cmp(&a.confidence));
    out.truncate(TOP_N);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::profiles::ProfileSet;
    use crate::types::{MergedThreat, NormalizedItem};
    use chrono::Utc;
    use uuid::Uuid;

    fn signals(tags: &[&str]) -> ItemSignals {
        ItemSignals::from_threat(&MergedThreat::from(NormalizedItem {
            id: Uuid::new_v4(),
            title: "campaign".into(),
            link: String::new(),
            source: "test".into(),
            description: String::new(),
            published: Utc::now(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }))
    }

    #[test]
    fn test_critical_stable_rule_scoring() {
        let rules = ProfileSet::builtin().detection_rules;
        let s = signals(&["T1566.001", "T1204.002"]);
        let recs = recommend(&s, &rules);
        // DR-001 matches both techniques: 2*10 + 5 (stable) = 25
        let dr1 = recs.iter().find(|r| r.rule_id == "DR-001").unwrap();
        assert_eq!(dr1.confidence, 25);
        assert_eq!(dr1.coverage, 100);
        assert_eq!(dr1.matched_techniques.len(), 2);
    }

    #[test]
    fn test_preview_bonus() {
        let rules = ProfileSet::builtin().detection_rules;
        let s = signals(&["T1190"]);
        let recs = recommend(&s, &rules);
        // DR-004: 1*7 + 3 (preview) = 10
        assert_eq!(recs[0].rule_id, "DR-004");
        assert_eq!(recs[0].confidence, 10);
    }

    #[test]
    fn test_partial_coverage() {
        let rules = ProfileSet::builtin().detection_rules;
        let s = signals(&["T1566.001", "T1486", "T1490", "T1105"]);
        let recs = recommend(&s, &rules);
        let dr1 = recs.iter().find(|r| r.rule_id == "DR-001").unwrap();
        // 1 of 4 item techniques
        assert_eq!(dr1.coverage, 25);
    }

    #[test]
    fn test_no_techniques_no_recommendations() {
        let rules = ProfileSet::builtin().detection_rules;
        assert!(recommend(&signals(&["ransomware"]), &rules).is_empty());
    }
}
