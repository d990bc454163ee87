use std::collections::{HashMap, HashSet};

use crate::models::{GivenSummary, Peg, ReceivedSummary};

/// Receiver view: one summary per distinct receiver, first-seen order.
pub fn aggregate_receivers(pegs: &[Peg]) -> Vec<ReceivedSummary> {
    let index = PegIndex::build(pegs);
    index
        .receivers()
        .iter()
        .map(|person_id| index.received_summary(person_id))
        .collect()
}

/// Sender view: one summary per distinct sender, first-seen order.
pub fn aggregate_by_sender(pegs: &[Peg]) -> Vec<GivenSummary> {
    let index = PegIndex::build(pegs);
    index
        .senders()
        .iter()
        .map(|person_id| index.given_summary(person_id))
        .collect()
}

/// Unique ids in first-seen order.
pub(crate) fn distinct<'a>(ids: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

#[derive(Default)]
struct PersonPegs<'a> {
    first_seen_name: Option<&'a str>,
    valid_received: Vec<&'a Peg>,
    penalties_given: Vec<&'a Peg>,
    valid_given: usize,
}

/// Pegs grouped by person in a single pass over the cycle.
pub(crate) struct PegIndex<'a> {
    receivers: Vec<&'a str>,
    senders: Vec<&'a str>,
    people: HashMap<&'a str, PersonPegs<'a>>,
}

impl<'a> PegIndex<'a> {
    pub(crate) fn build(pegs: &'a [Peg]) -> Self {
        let mut people: HashMap<&'a str, PersonPegs<'a>> = HashMap::new();

        for peg in pegs {
            let receiver = people.entry(peg.receiver_id.as_str()).or_default();
            receiver.first_seen_name.get_or_insert(peg.receiver_name.as_str());
            if peg.is_valid {
                receiver.valid_received.push(peg);
            }

            let sender = people.entry(peg.sender_id.as_str()).or_default();
            sender.first_seen_name.get_or_insert(peg.sender_name.as_str());
            if peg.is_valid {
                sender.valid_given += 1;
            } else {
                sender.penalties_given.push(peg);
            }
        }

        Self {
            receivers: distinct(pegs.iter().map(|peg| peg.receiver_id.as_str())),
            senders: distinct(pegs.iter().map(|peg| peg.sender_id.as_str())),
            people,
        }
    }

    pub(crate) fn receivers(&self) -> &[&'a str] {
        &self.receivers
    }

    pub(crate) fn senders(&self) -> &[&'a str] {
        &self.senders
    }

    pub(crate) fn valid_pegs_sent(&self, person_id: &str) -> usize {
        self.people
            .get(person_id)
            .map_or(0, |person| person.valid_given)
    }

    pub(crate) fn received_summary(&self, person_id: &str) -> ReceivedSummary {
        let tally = self.tally(person_id);
        ReceivedSummary {
            person_id: person_id.to_string(),
            person_name: tally.person_name,
            weighted_pegs_received: tally.weighted_pegs_received,
            valid_pegs_received: tally.valid_pegs_received,
            penalty_pegs_given: tally.penalty_pegs_given,
        }
    }

    pub(crate) fn given_summary(&self, person_id: &str) -> GivenSummary {
        let tally = self.tally(person_id);
        GivenSummary {
            person_id: person_id.to_string(),
            person_name: tally.person_name,
            weighted_pegs_received: tally.weighted_pegs_received,
            valid_pegs_given: tally.valid_pegs_given,
            valid_pegs_received: tally.valid_pegs_received,
            penalty_pegs_given: tally.penalty_pegs_given,
        }
    }

    fn tally(&self, person_id: &str) -> Tally {
        let Some(person) = self.people.get(person_id) else {
            return Tally {
                person_name: person_id.to_string(),
                weighted_pegs_received: 0.0,
                valid_pegs_given: 0,
                valid_pegs_received: Vec::new(),
                penalty_pegs_given: Vec::new(),
            };
        };

        let received_weight: f64 = person
            .valid_received
            .iter()
            .map(|peg| peg.peg_weighting)
            .sum();
        let weighted_pegs_received = received_weight - person.penalties_given.len() as f64;

        // Penalty-only receivers fall through to the first peg naming them.
        let person_name = person
            .valid_received
            .first()
            .map(|peg| peg.receiver_name.as_str())
            .or_else(|| person.penalties_given.first().map(|peg| peg.sender_name.as_str()))
            .or(person.first_seen_name)
            .unwrap_or(person_id)
            .to_string();

        Tally {
            person_name,
            weighted_pegs_received,
            valid_pegs_given: person.valid_given,
            valid_pegs_received: person.valid_received.iter().copied().cloned().collect(),
            penalty_pegs_given: person.penalties_given.iter().copied().cloned().collect(),
        }
    }
}

struct Tally {
    person_name: String,
    weighted_pegs_received: f64,
    valid_pegs_given: usize,
    valid_pegs_received: Vec<Peg>,
    penalty_pegs_given: Vec<Peg>,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::collections::BTreeSet;

    use crate::models::Peg;

    pub fn peg(sender: &str, receiver: &str, is_valid: bool, weight: f64) -> Peg {
        tagged_peg(sender, receiver, is_valid, weight, &[])
    }

    pub fn tagged_peg(
        sender: &str,
        receiver: &str,
        is_valid: bool,
        weight: f64,
        categories: &[&str],
    ) -> Peg {
        Peg {
            receiver_id: receiver.to_string(),
            receiver_name: format!("{receiver} name"),
            sender_id: sender.to_string(),
            sender_name: format!("{sender} name"),
            comment: categories.join(" "),
            categories: categories
                .iter()
                .map(|category| category.to_string())
                .collect::<BTreeSet<_>>(),
            is_valid,
            peg_weighting: if is_valid { weight } else { 0.0 },
            sender_location: None,
            receiver_location: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::peg;
    use super::*;
    use crate::models::PersonSummary;

    #[test]
    fn distinct_keeps_first_seen_order() {
        assert_eq!(distinct(["b", "a", "b", "c", "a"]), vec!["b", "a", "c"]);
    }

    #[test]
    fn receiver_score_subtracts_unweighted_penalties() {
        let pegs = vec![
            peg("bob", "ann", true, 2.0),
            peg("cat", "ann", true, 1.5),
            peg("ann", "bob", false, 0.0),
            peg("ann", "cat", false, 0.0),
        ];
        let results = aggregate_receivers(&pegs);
        let ids: Vec<&str> = results.iter().map(|result| result.person_id()).collect();
        assert_eq!(ids, vec!["ann", "bob", "cat"]);

        let ann = &results[0];
        assert_eq!(ann.person_name, "ann name");
        assert_eq!(ann.valid_pegs_received.len(), 2);
        assert_eq!(ann.penalty_pegs_given.len(), 2);
        assert!((ann.weighted_pegs_received - 1.5).abs() < 1e-9);
        assert_eq!(ann.net_peg_count(), 0);
    }

    #[test]
    fn penalties_alone_drive_score_negative() {
        let pegs = vec![
            peg("bob", "ann", false, 0.0),
            peg("bob", "cat", false, 0.0),
        ];
        let givers = aggregate_by_sender(&pegs);
        assert_eq!(givers.len(), 1);
        assert_eq!(givers[0].person_id, "bob");
        assert_eq!(givers[0].person_name, "bob name");
        assert_eq!(givers[0].weighted_pegs_received, -2.0);
        assert_eq!(givers[0].valid_pegs_given, 0);
    }

    #[test]
    fn penalty_only_receiver_still_gets_a_name() {
        let pegs = vec![peg("bob", "ann", false, 0.0)];
        let results = aggregate_receivers(&pegs);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].person_name, "ann name");
        assert_eq!(results[0].weighted_pegs_received, 0.0);
    }

    #[test]
    fn sender_view_counts_valid_pegs_given() {
        let pegs = vec![
            peg("ann", "bob", true, 1.0),
            peg("ann", "cat", true, 1.0),
            peg("ann", "cat", false, 0.0),
            peg("bob", "ann", true, 3.0),
        ];
        let givers = aggregate_by_sender(&pegs);
        assert_eq!(givers[0].person_id, "ann");
        assert_eq!(givers[0].valid_pegs_given, 2);
        assert!((givers[0].weighted_pegs_received - 2.0).abs() < 1e-9);
        assert_eq!(givers[1].person_id, "bob");
        assert_eq!(givers[1].valid_pegs_given, 1);
    }

    #[test]
    fn index_groups_each_person_once() {
        let pegs = vec![
            peg("ann", "bob", true, 1.0),
            peg("bob", "ann", false, 0.0),
            peg("ann", "cat", true, 2.0),
            peg("cat", "bob", true, 3.0),
        ];
        let index = PegIndex::build(&pegs);
        assert_eq!(index.receivers(), &["bob", "ann", "cat"]);
        assert_eq!(index.senders(), &["ann", "bob", "cat"]);
        assert_eq!(index.valid_pegs_sent("ann"), 2);
        assert_eq!(index.valid_pegs_sent("bob"), 0);
        assert_eq!(index.valid_pegs_sent("nobody"), 0);

        let bob = index.received_summary("bob");
        assert_eq!(bob.valid_pegs_received.len(), 2);
        assert_eq!(bob.penalty_pegs_given.len(), 1);
        assert!((bob.weighted_pegs_received - 3.0).abs() < 1e-9);
    }

    #[test]
    fn duplicate_events_are_counted_twice() {
        let pegs = vec![peg("bob", "ann", true, 1.0), peg("bob", "ann", true, 1.0)];
        let results = aggregate_receivers(&pegs);
        assert_eq!(results[0].valid_pegs_received.len(), 2);
        assert_eq!(results[0].weighted_pegs_received, 2.0);
    }
}
