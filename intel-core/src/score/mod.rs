//! Risk scoring: evidence-weighted base score plus phase-2 enhancements

pub mod base;
pub mod enhanced;
pub mod rules;

pub use base::{base_score, base_severity, source_multiplier};
pub use enhanced::{enhance, enhanced_severity};

use chrono::{DateTime, Utc};

use crate::types::{MergedThreat, RiskAssessment};

/// Full assessment for one item: base score, then enhanced bonuses and
/// badges. `related_count` comes from the correlator.
pub fn assess(threat: &MergedThreat, related_count: usize, now: DateTime<Utc>) -> RiskAssessment {
    let base = base_score(threat, now);
    enhance(&base, threat, related_count)
}
