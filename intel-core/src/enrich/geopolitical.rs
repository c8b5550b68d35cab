//! Geopolitical context enricher
//!
//! Links items to regions of tension via country, actor, sector and
//! conflict-vocabulary mentions.

use super::profiles::GeoProfile;
use super::{clamp_confidence, finalize, ItemSignals};
use crate::types::AttributionMatch;

const COUNTRY_SCORE: u32 = 40;
const ACTOR_SCORE: u32 = 30;
const SECTOR_SCORE: u32 = 15;
const KEYWORD_SCORE: u32 = 10;
const MIN_CONFIDENCE: u8 = 20;
const TOP_N: usize = 3;

/// Score every geo profile against the item; keep the strongest contexts.
pub fn contextualize(signals: &ItemSignals, profiles: &[GeoProfile]) -> Vec<AttributionMatch> {
    let matches = profiles
        .iter()
        .filter_map(|profile| {
            let mut score = 0u32;
            let mut matched: Vec<String> = Vec::new();

            for country in &profile.countries {
                if signals.mentions(country) {
                    score += COUNTRY_SCORE;
                    matched.push(format!("country:{}", country));
                }
            }
            for actor in &profile.actors {
                if signals.mentions(actor) {
                    score += ACTOR_SCORE;
                    matched.push(format!("actor:{}", actor));
                }
            }
            for sector in &profile.sectors {
                if signals.mentions(sector) {
                    score += SECTOR_SCORE;
                    matched.push(format!("sector:{}", sector));
                }
            }
            for keyword in &profile.keywords {
                if signals.mentions(keyword) {
                    score += KEYWORD_SCORE;
                    matched.push(format!("keyword:{}", keyword));
                }
            }

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
