//! Ranker: deterministic bubble-up ordering and top-N selection

use crate::types::ThreatRecord;

/// Stable sort by `(score desc, source_count desc, published desc)`.
///
/// Every key is a total order, so re-sorting sorted input is a no-op; items
/// tying on all three keys keep their relative input order.
pub fn bubble_up_sort(items: &mut [ThreatRecord]) {
    items.sort_by(|a, b| {
        b.risk
            .score
            .cmp(&a.risk.score)
            .then_with(|| b.source_count.cmp(&a.source_count))
            .then_with(|| b.published.cmp(&a.published))
    });
}

/// The first `n` items of the sorted batch (or the whole batch when it is
/// shorter than `n`).
pub fn top_threats(items: &[ThreatRecord], n: usize) -> Vec<ThreatRecord> {
    let mut sorted = items.to_vec();
    bubble_up_sort(&mut sorted);
    sorted.truncate(n);
    sorted
}
