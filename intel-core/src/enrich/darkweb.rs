//! Dark-web correlation enricher
//!
//! Two matching paths: ransomware leak-site victim records (keyword scoring)
//! and indexed pastes/dumps (per-hit IOC overlap scoring).

use super::profiles::{PasteRecord, VictimRecord};
use super::{clamp_confidence, finalize, ItemSignals};
use crate::types::{AttributionMatch, DarkWebIntel};

// Victim correlation weights
const VICTIM_NAME_SCORE: u32 = 50;
const GROUP_NAME_SCORE: u32 = 30;
const INDUSTRY_SCORE: u32 = 10;
const ORG_PARTIAL_SCORE: u32 = 20;
const VICTIM_MIN_CONFIDENCE: u8 = 20;
const VICTIM_TOP_N: usize = 5;

// Paste correlation per-hit weights
const PASTE_IP_SCORE: u32 = 15;
const PASTE_DOMAIN_SCORE: u32 = 20;
const PASTE_EMAIL_SCORE: u32 = 10;
const PASTE_HASH_SCORE: u32 = 25;
const PASTE_CVE_SCORE: u32 = 30;
const PASTE_TOP_N: usize = 10;

/// Run both dark-web paths over one item.
pub fn correlate(
    signals: &ItemSignals,
    victims: &[VictimRecord],
    pastes: &[PasteRecord],
) -> DarkWebIntel {
    DarkWebIntel {
        victims: correlate_victims(signals, victims),
        pastes: correlate_pastes(signals, pastes),
    }
}

/// Match the item against ransomware leak-site victim records.
pub fn correlate_victims(signals: &ItemSignals, victims: &[VictimRecord]) -> Vec<AttributionMatch> {
    let matches = victims
        .iter()
        .filter_map(|record| {
            let mut score = 0u32;
            let mut matched: Vec<String> = Vec::new();

            if signals.mentions(&record.victim) {
                score += VICTIM_NAME_SCORE;
                matched.push(format!("victim:{}", record.victim));
            } else if let Some(word) = partial_org_match(signals, &record.victim) {
                score += ORG_PARTIAL_SCORE;
                matched.push(format!("org-partial:{}", word));
            }

            if signals.mentions(&record.group) {
                score += GROUP_NAME_SCORE;
                matched.push(format!("group:{}", record.group));
            }

            if !record.industry.is_empty() && signals.mentions(&record.industry) {
                score += INDUSTRY_SCORE;
                matched.push(format!("industry:{}", record.industry));
            }

            if score == 0 {
                return None;
            }
            Some(AttributionMatch {
                profile_id: record.id.clone(),
                profile_name: record.victim.clone(),
                confidence: clamp_confidence(score),
                matched_indicators: matched,
            })
        })
        .collect();

    finalize(matches, VICTIM_MIN_CONFIDENCE, VICTIM_TOP_N)
}

/// Match the item's extracted IOCs against indexed pastes. Any overlap at
/// all qualifies; confidence accumulates per hit.
pub fn correlate_pastes(signals: &ItemSignals, pastes: &[PasteRecord]) -> Vec<AttributionMatch> {
    let matches = pastes
        .iter()
        .filter_map(|paste| {
            let mut score = 0u32;
            let mut matched: Vec<String> = Vec::new();

            score += hits(&paste.ips, |v| signals.indicators.ips.contains(v), PASTE_IP_SCORE, "ip", &mut matched);
            score += hits(&paste.domains, |v| signals.indicators.domains.contains(v), PASTE_DOMAIN_SCORE, "domain", &mut matched);
            score += hits(&paste.emails, |v| signals.indicators.emails.contains(v), PASTE_EMAIL_SCORE, "email", &mut matched);
            score += hits(
                &paste.hashes,
                |v| signals.indicators.hashes.iter().any(|(_, h)| h == v),
                PASTE_HASH_SCORE,
                "hash",
                &mut matched,
            );
            score += hits(
                &paste.cves,
                |v| signals.indicators.cves.iter().any(|c| c.eq_ignore_ascii_case(v)),
                PASTE_CVE_SCORE,
                "cve",
                &mut matched,
            );

            if score == 0 {
                return None;
            }
            Some(AttributionMatch {
                profile_id: paste.id.clone(),
                profile_name: paste.source.clone(),
                confidence: clamp_confidence(score),
                matched_indicators: matched,
            })
        })
        .collect();

    // Any positive score qualifies.
    finalize(matches, 1, PASTE_TOP_N)
}

fn hits<F: Fn(&String) -> bool>(
    values: &[String],
    contains: F,
    per_hit: u32,
    kind: &str,
    matched: &mut Vec<String>,
) -> u32 {
    let mut score = 0;
    for value in values {
        let lowered = value.to_lowercase();
        if contains(&lowered) {
            score += per_hit;
            matched.push(format!("{}:{}", kind, lowered));
        }
    }
    score
}

/// A standalone word (4+ chars) of the organization name appearing in the
/// item counts as a partial match.
fn partial_org_match<'a>(signals: &ItemSignals, org: &'a str) -> Option<&'a str> {
    org.split_whitespace()
        .filter(|w| w.len() >= 4)
        .find(|w| signals.mentions(w))
}
