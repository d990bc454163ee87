use tracing::debug;

use crate::aggregate::PegIndex;
use crate::models::{Peg, ReceivedSummary};

/// Scores are float sums, so two people with the same weights can differ in
/// the last bits depending on summation order.
pub const SCORE_TOLERANCE: f64 = 1e-9;

/// Picks the cycle's winners from every receiver who gave at least
/// `minimum_valid_given` valid pegs, keeping everyone tied at the cutoff.
///
/// Sorted by weighted score, highest first. May hold more than
/// `winner_count` entries when scores tie at the boundary.
pub fn select_winners(
    pegs: &[Peg],
    minimum_valid_given: usize,
    winner_count: usize,
) -> Vec<ReceivedSummary> {
    if winner_count == 0 {
        return Vec::new();
    }

    let index = PegIndex::build(pegs);
    let mut eligible: Vec<ReceivedSummary> = index
        .receivers()
        .iter()
        .filter(|candidate| {
            let sent = index.valid_pegs_sent(candidate);
            if sent < minimum_valid_given {
                debug!(candidate, sent, minimum_valid_given, "not eligible to win");
                return false;
            }
            true
        })
        .map(|candidate| index.received_summary(candidate))
        .collect();

    eligible.sort_by(|a, b| b.weighted_pegs_received.total_cmp(&a.weighted_pegs_received));

    let Some(cutoff) = cutoff_score(&eligible, winner_count) else {
        return Vec::new();
    };
    eligible.retain(|result| result.weighted_pegs_received >= cutoff - SCORE_TOLERANCE);
    eligible
}

/// Score of the `winner_count`-th entry of a descending list, or of the last
/// entry when the list is shorter.
pub fn cutoff_score(ranked: &[ReceivedSummary], winner_count: usize) -> Option<f64> {
    if winner_count == 0 {
        return None;
    }
    let index = winner_count.min(ranked.len()).checked_sub(1)?;
    ranked.get(index).map(|result| result.weighted_pegs_received)
}
