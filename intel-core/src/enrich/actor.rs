//! Threat-actor attribution enricher
//!
//! Criminal/crimeware actor profiles, scored with the lower bound of the
//! actor weight table.

use super::profiles::ActorProfile;
use super::{clamp_confidence, finalize, score_actor_profile, ActorWeights, ItemSignals};
use crate::types::AttributionMatch;

const WEIGHTS: ActorWeights = ActorWeights {
    malware: 30,
    technique: 20,
    tool: 20,
    sector: 15,
    country: 5,
    name: 40,
};

const MIN_CONFIDENCE: u8 = 25;
const TOP_N: usize = 3;

/// Score every actor profile against the item; keep the strongest matches.
pub fn attribute(signals: &ItemSignals, profiles: &[ActorProfile]) -> Vec<AttributionMatch> {
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

    fn signals(title: &str, description: &str) -> ItemSignals {
        ItemSignals::from_threat(&MergedThreat::from(NormalizedItem {
            id: Uuid::new_v4(),
            title: title.into(),
            link: String::new(),
            source: "test".into(),
            description: description.into(),
            published: Utc::now(),
            tags: vec![],
        }))
    }

    #[test]
    fn test_malware_family_attribution() {
        let set = ProfileSet::builtin();
        let s = signals("TrickBot resurgence", "new Conti affiliate activity observed");
        let matches = attribute(&s, &set.actors);
        assert_eq!(matches[0].profile_id, "wizard-spider");
        // 2 malware families at 30 each
        assert_eq!(matches[0].confidence, 60);
    }

    #[test]
    fn test_top_n_is_three() {
        let set = ProfileSet::builtin();
        // Mentions every builtin actor by name.
        let s = signals(
            "FIN7, Wizard Spider, Scattered Spider and TA505 activity roundup",
            "",
        );
        let matches = attribute(&s, &set.actors);
        assert_eq!(matches.len(), 3);
    }

    #[test]
    fn test_lone_sector_below_threshold() {
        let set = ProfileSet::builtin();
        let s = signals("finance news", "");
        assert!(attribute(&s, &set.actors).is_empty());
    }
}
