//! Attribution enrichers
//!
//! Five independent enrichers match item text against reference profile
//! sets, each producing a typed, confidence-scored annotation. They share
//! one extractor and one finalize step (clamp to [0,100], filter by the
//! enricher's minimum, sort descending, truncate to its top-N). Running
//! none, some or all of them produces a strict superset of annotations with
//! no cross-enricher side effects.

pub mod actor;
pub mod apt;
pub mod darkweb;
pub mod detection;
pub mod geopolitical;
pub mod profiles;

use crate::extract::{extract_indicators, extract_techniques, IndicatorSet};
use crate::types::{AttributionMatch, MergedThreat};

pub use profiles::ProfileSet;

/// Everything an enricher needs from one item, computed once.
#[derive(Debug, Clone)]
pub struct ItemSignals {
    /// Lowercased title + description + tags, the keyword haystack.
    pub text: String,
    pub indicators: IndicatorSet,
    /// Technique ids from tags and text, uppercased.
    pub techniques: Vec<String>,
}

impl ItemSignals {
    pub fn from_threat(threat: &MergedThreat) -> Self {
        let combined = format!(
            "{} {} {}",
            threat.primary.title,
            threat.primary.description,
            threat.tags.join(" ")
        );
        let indicators = extract_indicators(&combined);
        let techniques: Vec<String> = extract_techniques(&combined).into_iter().collect();
        Self {
            text: combined.to_lowercase(),
            indicators,
            techniques,
        }
    }

    /// Case-insensitive keyword presence.
    pub fn mentions(&self, keyword: &str) -> bool {
        let keyword = keyword.trim().to_lowercase();
        !keyword.is_empty() && self.text.contains(&keyword)
    }
}

/// Clamp a raw score into the 0-100 confidence range.
pub(crate) fn clamp_confidence(score: u32) -> u8 {
    score.min(100) as u8
}

/// Shared tail of every enricher: filter, sort descending (stable),
/// truncate.
pub(crate) fn finalize(
    mut matches: Vec<AttributionMatch>,
    min_confidence: u8,
    top_n: usize,
) -> Vec<AttributionMatch> {
    matches.retain(|m| m.confidence >= min_confidence);
    matches.sort_by(|a, b| b.confidence.cmp(&a.confidence));
    matches.truncate(top_n);
    matches
}

/// Weights for scoring an actor-style profile (APT and criminal actor
/// enrichers use the same matching with different tables).
#[derive(Debug, Clone, Copy)]
pub(crate) struct ActorWeights {
    pub malware: u32,
    pub technique: u32,
    pub tool: u32,
    pub sector: u32,
    pub country: u32,
    pub name: u32,
}

/// Score one profile against one item's signals. Returns the summed score
/// and the matched indicators, one entry per hit.
pub(crate) fn score_actor_profile(
    signals: &ItemSignals,
    profile: &profiles::ActorProfile,
    weights: &ActorWeights,
) -> (u32, Vec<String>) {
    let mut score = 0u32;
    let mut matched: Vec<String> = Vec::new();

    if signals.mentions(&profile.name)
        || profile.aliases.iter().any(|a| signals.mentions(a))
    {
        score += weights.name;
        matched.push(format!("name:{}", profile.name));
    }

    for malware in &profile.malware {
        if signals.mentions(malware) {
            score += weights.malware;
            matched.push(format!("malware:{}", malware));
        }
    }

    for technique in &profile.techniques {
        if signals
            .techniques
            .iter()
            .any(|t| t.eq_ignore_ascii_case(technique))
        {
            score += weights.technique;
            matched.push(format!("technique:{}", technique.to_uppercase()));
        }
    }

    for tool in &profile.tools {
        if signals.mentions(tool) {
            score += weights.tool;
            matched.push(format!("tool:{}", tool));
        }
    }

    for sector in &profile.sectors {
        if signals.mentions(sector) {
            score += weights.sector;
            matched.push(format!("sector:{}", sector));
        }
    }

    for country in &profile.countries {
        if signals.mentions(country) {
            score += weights.country;
            matched.push(format!("country:{}", country));
        }
    }

    (score, matched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NormalizedItem;
    use chrono::Utc;
    use uuid::Uuid;

    fn threat_with(title: &str, description: &str, tags: &[&str]) -> MergedThreat {
        MergedThreat::from(NormalizedItem {
            id: Uuid::new_v4(),
            title: title.into(),
            link: "https://example.test/a".into(),
            source: "test".into(),
            description: description.into(),
            published: Utc::now(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        })
    }

    #[test]
    fn test_signals_include_tags() {
        let t = threat_with("campaign", "details", &["LockBit", "T1486"]);
        let signals = ItemSignals::from_threat(&t);
        assert!(signals.mentions("lockbit"));
        assert!(signals.techniques.contains(&"T1486".to_string()));
    }

    #[test]
    fn test_finalize_filters_sorts_truncates() {
        let m = |c: u8| AttributionMatch {
            profile_id: format!("p{}", c),
            profile_name: "p".into(),
            confidence: c,
            matched_indicators: vec![],
        };
        let out = finalize(vec![m(10), m(90), m(50), m(70), m(60)], 50, 3);
        let confidences: Vec<u8> = out.iter().map(|m| m.confidence).collect();
        assert_eq!(confidences, vec![90, 70, 60]);
    }

    #[test]
    fn test_clamp_confidence() {
        assert_eq!(clamp_confidence(250), 100);
        assert_eq!(clamp_confidence(40), 40);
    }
}
