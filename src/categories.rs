use std::collections::HashSet;

use crate::models::{CategoryBreakdown, ReceivedSummary};

/// Splits results per keyword, keeping only pegs tagged with it.
///
/// Every category is returned, even with no results, in the order given.
/// Results within a category are ordered by matching peg count, highest
/// first. The input is only read; the returned results are copies.
pub fn group_by_category<S: AsRef<str>>(
    results: &[ReceivedSummary],
    categories: &[S],
) -> Vec<CategoryBreakdown> {
    let mut seen = HashSet::new();
    categories
        .iter()
        .map(|category| category.as_ref())
        .filter(|category| seen.insert(*category))
        .map(|category| CategoryBreakdown {
            category: category.to_string(),
            results: results_for(results, category),
        })
        .collect()
}

fn results_for(results: &[ReceivedSummary], category: &str) -> Vec<ReceivedSummary> {
    let mut filtered: Vec<ReceivedSummary> = results
        .iter()
        .filter_map(|result| {
            let pegs: Vec<_> = result
                .valid_pegs_received
                .iter()
                .filter(|peg| peg.categories.contains(category))
                .cloned()
                .collect();
            if pegs.is_empty() {
                return None;
            }
            let mut copy = result.clone();
            copy.valid_pegs_received = pegs;
            Some(copy)
        })
        .collect();

    filtered.sort_by(|a, b| b.valid_pegs_received.len().cmp(&a.valid_pegs_received.len()));
    filtered
}
