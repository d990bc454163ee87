use anyhow::Context;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::aggregate;
use crate::categories;
use crate::config::PegConfig;
use crate::enrich;
use crate::models::{
    CategoryBreakdown, GivenSummary, LocationDirectory, Peg, RawPegEvent, ReceivedSummary,
};
use crate::winners;

/// Everything one run reads, fetched up front so the run sees a single
/// consistent view.
#[derive(Debug, Clone)]
pub struct CycleSnapshot {
    pub cycle_start: DateTime<Utc>,
    pub events: Vec<RawPegEvent>,
    pub config: PegConfig,
    pub locations: LocationDirectory,
}

#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub cycle_start: DateTime<Utc>,
    pub pegs: Vec<Peg>,
    pub results: Vec<ReceivedSummary>,
    pub givers: Vec<GivenSummary>,
    pub winners: Vec<ReceivedSummary>,
    pub categories: Vec<CategoryBreakdown>,
}

pub fn run(snapshot: &CycleSnapshot) -> CycleOutcome {
    let config = &snapshot.config;
    if config.location_weights.is_empty() {
        debug!("no location weights configured, cross-location pegs use the default weight");
    }
    let pegs = enrich::enrich(&snapshot.events, config, &snapshot.locations);
    let results = aggregate::aggregate_receivers(&pegs);
    let givers = aggregate::aggregate_by_sender(&pegs);
    let winners = winners::select_winners(&pegs, config.minimum_valid_given, config.winner_count);
    let categories = categories::group_by_category(&results, &config.keywords);

    let valid = pegs.iter().filter(|peg| peg.is_valid).count();
    info!(
        cycle_start = %snapshot.cycle_start,
        pegs = pegs.len(),
        valid,
        penalties = pegs.len() - valid,
        people = results.len(),
        location_pairs = config.location_weights.len(),
        winners = winners.len(),
        "cycle scored"
    );

    CycleOutcome {
        cycle_start: snapshot.cycle_start,
        pegs,
        results,
        givers,
        winners,
        categories,
    }
}

/// Start of a window of `cycle_days` (at least one) ending now.
pub fn cycle_start(cycle_days: i64) -> anyhow::Result<DateTime<Utc>> {
    Duration::try_days(cycle_days.max(1))
        .and_then(|window| Utc::now().checked_sub_signed(window))
        .with_context(|| format!("a {cycle_days}-day cycle reaches past the supported date range"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PersonSummary;
    use crate::weighting::LocationWeights;

    fn event(sender: &str, receiver: &str, comment: &str) -> RawPegEvent {
        RawPegEvent {
            receiver_id: receiver.to_string(),
            receiver_name: receiver.to_string(),
            sender_id: sender.to_string(),
            sender_name: sender.to_string(),
            comment: comment.to_string(),
        }
    }

    fn snapshot(events: Vec<RawPegEvent>) -> CycleSnapshot {
        let mut location_weights = LocationWeights::default();
        location_weights.insert("Sydney", "Melbourne", 3.0);
        let mut locations = LocationDirectory::default();
        locations.by_person.insert("ann".to_string(), Some("Sydney".to_string()));
        locations.by_person.insert("bob".to_string(), Some("Melbourne".to_string()));
        locations.by_person.insert("cat".to_string(), Some("Sydney".to_string()));
        locations.names = vec!["Sydney".to_string(), "Melbourne".to_string()];

        CycleSnapshot {
            cycle_start: Utc::now(),
            events,
            config: PegConfig {
                require_keywords: true,
                keywords: vec!["brave".to_string(), "awesome".to_string()],
                penalty_keywords: vec!["shame".to_string()],
                minimum_valid_given: 1,
                winner_count: 1,
                remote_location_weighting_default: None,
                peg_limit_per_cycle: None,
                location_weights,
            },
            locations,
        }
    }

    #[test]
    fn weighted_winners_and_unweighted_results_diverge() {
        let events = vec![
            event("bob", "ann", "brave work"),
            event("ann", "cat", "awesome"),
            event("ann", "cat", "brave"),
            event("cat", "bob", "nice one"),
            event("cat", "ann", "shame"),
        ];
        let outcome = run(&snapshot(events));

        assert_eq!(outcome.pegs.len(), 5);
        assert_eq!(outcome.winners.len(), 1);
        assert_eq!(outcome.winners[0].person_id, "ann");
        assert_eq!(outcome.winners[0].weighted_pegs_received, 3.0);

        let ann = outcome
            .results
            .iter()
            .find(|result| result.person_id == "ann")
            .expect("ann has a result");
        assert_eq!(ann.net_peg_count(), 1);

        let cat = outcome
            .results
            .iter()
            .find(|result| result.person_id == "cat")
            .expect("cat has a result");
        assert_eq!(cat.net_peg_count(), 0);
        assert_eq!(cat.weighted_pegs_received, 0.0);
    }

    #[test]
    fn breakdowns_follow_keyword_order() {
        let outcome = run(&snapshot(vec![event("bob", "ann", "brave")]));
        let names: Vec<&str> = outcome
            .categories
            .iter()
            .map(|breakdown| breakdown.category.as_str())
            .collect();
        assert_eq!(names, vec!["brave", "awesome"]);
        assert!(outcome.categories[1].results.is_empty());
    }

    #[test]
    fn empty_cycle_has_no_winners() {
        let outcome = run(&snapshot(Vec::new()));
        assert!(outcome.pegs.is_empty());
        assert!(outcome.winners.is_empty());
        assert_eq!(outcome.categories.len(), 2);
    }

    #[test]
    fn cycle_start_is_at_least_a_day_back() {
        let start = cycle_start(0).expect("one-day window");
        assert!(Utc::now() - start >= Duration::days(1));
    }

    #[test]
    fn oversized_cycle_is_an_error() {
        assert!(cycle_start(1_000_000_000).is_err());
        assert!(cycle_start(i64::MAX).is_err());
    }
}
