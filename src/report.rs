use std::fmt::Write;

use crate::models::{GivenSummary, PersonSummary, ReceivedSummary};
use crate::pipeline::CycleOutcome;

/// General results ranked by the unweighted net peg count.
pub fn rank_results(results: &[ReceivedSummary]) -> Vec<&ReceivedSummary> {
    let mut ranked: Vec<&ReceivedSummary> = results.iter().collect();
    ranked.sort_by(|a, b| b.net_peg_count().cmp(&a.net_peg_count()));
    ranked
}

/// Givers ordered by valid pegs given, then by penalties.
pub fn rank_givers(givers: &[GivenSummary]) -> Vec<&GivenSummary> {
    let mut ranked: Vec<&GivenSummary> = givers.iter().collect();
    ranked.sort_by(|a, b| {
        b.valid_pegs_given
            .cmp(&a.valid_pegs_given)
            .then_with(|| b.penalty_pegs_given.len().cmp(&a.penalty_pegs_given.len()))
    });
    ranked
}

pub fn build_report(outcome: &CycleOutcome) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Peg Cycle Report");
    let _ = writeln!(
        output,
        "Pegs given since {} ({} total)",
        outcome.cycle_start.format("%Y-%m-%d %H:%M UTC"),
        outcome.pegs.len()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Winners");

    if outcome.winners.is_empty() {
        let _ = writeln!(output, "No winners this cycle.");
    } else {
        for winner in outcome.winners.iter() {
            let _ = writeln!(
                output,
                "- {}: weighted score {:.1} from {} pegs",
                winner.person_name(),
                winner.weighted_pegs_received(),
                winner.valid_pegs_received().len()
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Results");

    if outcome.results.is_empty() {
        let _ = writeln!(output, "No pegs given this cycle.");
    } else {
        let _ = writeln!(output, "| Name | Pegs received | Penalties given | Total |");
        let _ = writeln!(output, "|------|---------------|-----------------|-------|");
        for result in rank_results(&outcome.results) {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} |",
                result.person_name(),
                result.valid_pegs_received().len(),
                result.penalty_pegs_given().len(),
                result.net_peg_count()
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Givers");

    if outcome.givers.is_empty() {
        let _ = writeln!(output, "No pegs given this cycle.");
    } else {
        for giver in rank_givers(&outcome.givers) {
            let _ = writeln!(
                output,
                "- {}: {} valid pegs given, {} penalties",
                giver.person_name(),
                giver.valid_pegs_given,
                giver.penalty_pegs_given().len()
            );
        }
    }

    for breakdown in outcome.categories.iter() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Keyword: {}", breakdown.category);

        if breakdown.results.is_empty() {
            let _ = writeln!(output, "No pegs for this keyword.");
            continue;
        }
        for result in breakdown.results.iter() {
            let _ = writeln!(
                output,
                "- {}: {} pegs",
                result.person_name(),
                result.valid_pegs_received().len()
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::fixtures::{peg, tagged_peg};
    use crate::aggregate::{aggregate_by_sender, aggregate_receivers};
    use crate::categories::group_by_category;
    use crate::winners::select_winners;
    use chrono::Utc;

    fn outcome(pegs: Vec<crate::models::Peg>) -> CycleOutcome {
        let results = aggregate_receivers(&pegs);
        CycleOutcome {
            cycle_start: Utc::now(),
            givers: aggregate_by_sender(&pegs),
            winners: select_winners(&pegs, 0, 1),
            categories: group_by_category(&results, &["brave", "awesome"]),
            results,
            pegs,
        }
    }

    #[test]
    fn empty_cycle_renders_placeholders() {
        let report = build_report(&outcome(Vec::new()));
        assert!(report.contains("No winners this cycle."));
        assert!(report.contains("## Keyword: brave"));
        assert!(report.contains("No pegs for this keyword."));
    }

    #[test]
    fn lists_winners_and_keyword_sections() {
        let pegs = vec![
            tagged_peg("bob", "ann", true, 2.0, &["brave"]),
            peg("ann", "bob", false, 0.0),
        ];
        let report = build_report(&outcome(pegs));
        assert!(report.contains("- ann name: weighted score 1.0 from 1 pegs"));
        assert!(report.contains("| ann name | 1 | 1 | 0 |"));
        assert!(report.contains("- ann name: 0 valid pegs given, 1 penalties"));
        assert!(report.contains("## Keyword: awesome\nNo pegs for this keyword."));
    }

    #[test]
    fn results_rank_by_net_count() {
        let pegs = vec![
            peg("x", "a", true, 5.0),
            peg("x", "b", true, 1.0),
            peg("y", "b", true, 1.0),
        ];
        let results = aggregate_receivers(&pegs);
        let ranked: Vec<&str> = rank_results(&results)
            .into_iter()
            .map(|result| result.person_id.as_str())
            .collect();
        assert_eq!(ranked, vec!["b", "a"]);
    }
}
