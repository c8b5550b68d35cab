//! APT correlation enricher
//!
//! Matches item text against known APT group profiles. Uses the upper bound
//! of the actor weight table; the criminal-actor enricher uses the lower.

use super::profiles::ActorProfile;
use super::{clamp_confidence, finalize, score_actor_profile, ActorWeights, ItemSignals};
use crate::types::AttributionMatch;

const WEIGHTS: ActorWeights = ActorWeights {
    malware: 40,
    technique: 30,
    tool: 20,
    sector: 20,
    country: 5,
    name: 40,
};

const MIN_CONFIDENCE: u8 = 30;
const TOP_N: usize = 5;

/// Score every APT profile against the item; keep the strongest matches.
pub fn correlate(signals: &ItemSignals, profiles: &[ActorProfile]) -> Vec<AttributionMatch> {
    let matches = profiles
        .iter()
        .filter_map(|profile| {
            let (score, matched) = score_actor_profile(signals, profile, &WEIGHTS);
            if score == 0 {
                return None;
            }
            Some(AttributionMatch {
                profile_id: profile.id.clone(),
                profile_name: profile.name.clone(),
                confidence: clamp_confidence(score),
                matched_indicators: matched,
            })
        })
        .collect();

    finalize(matches, MIN_CONFIDENCE, TOP_N)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::profiles::ProfileSet;
    use crate::types::{MergedThreat, NormalizedItem};
    use chrono::Utc;
    use uuid::Uuid;

    fn signals(title: &str, description: &str, tags: &[&str]) -> ItemSignals {
        ItemSignals::from_threat(&MergedThreat::from(NormalizedItem {
            id: Uuid::new_v4(),
            title: title.into(),
            link: String::new(),
            source: "test".into(),
            description: description.into(),
            published: Utc::now(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }))
    }

    #[test]
    fn test_name_mention_scores_forty() {
        let set = ProfileSet::builtin();
        let s = signals("APT28 targets ministries", "", &[]);
        let matches = correlate(&s, &set.apt_groups);
        assert_eq!(matches[0].profile_id, "apt28");
        assert_eq!(matches[0].confidence, 40);
    }

    #[test]
    fn test_alias_and_malware_accumulate() {
        let set = ProfileSet::builtin();
        // alias (40) + malware (40) + technique (30) = 110, clamped to 100
        let s = signals(
            "Fancy Bear deploys Zebrocy",
            "initial access via T1566.001 spearphishing",
            &[],
        );
        let matches = correlate(&s, &set.apt_groups);
        assert_eq!(matches[0].profile_id, "apt28");
        assert_eq!(matches[0].confidence, 100);
        assert!(matches[0]
            .matched_indicators
            .contains(&"malware:Zebrocy".to_string()));
    }

    #[test]
    fn test_below_threshold_filtered() {
        let set = ProfileSet::builtin();
        // A lone country mention (5) or sector (20) stays below 30.
        let s = signals("outage report in Ukraine", "", &[]);
        assert!(correlate(&s, &set.apt_groups).is_empty());
    }

    #[test]
    fn test_empty_profiles_empty_result() {
        let s = signals("APT28 campaign", "", &[]);
        assert!(correlate(&s, &[]).is_empty());
    }
}
