use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

/// One peg row as stored, already scoped to the current cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPegEvent {
    pub receiver_id: String,
    pub receiver_name: String,
    pub sender_id: String,
    pub sender_name: String,
    pub comment: String,
}

/// A peg after classification and weighting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Peg {
    pub receiver_id: String,
    pub receiver_name: String,
    pub sender_id: String,
    pub sender_name: String,
    pub comment: String,
    pub categories: BTreeSet<String>,
    pub is_valid: bool,
    /// Zero whenever `is_valid` is false.
    pub peg_weighting: f64,
    pub sender_location: Option<String>,
    pub receiver_location: Option<String>,
}

/// Shared read access to the per-person aggregates.
pub trait PersonSummary {
    fn person_id(&self) -> &str;
    fn person_name(&self) -> &str;
    fn valid_pegs_received(&self) -> &[Peg];
    fn penalty_pegs_given(&self) -> &[Peg];
    /// Sum of received peg weights minus one per penalty given.
    fn weighted_pegs_received(&self) -> f64;

    /// Unweighted variant used by the general results table.
    fn net_peg_count(&self) -> i64 {
        self.valid_pegs_received().len() as i64 - self.penalty_pegs_given().len() as i64
    }
}

/// Receiver-centric aggregate: results and winners.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReceivedSummary {
    pub person_id: String,
    pub person_name: String,
    pub weighted_pegs_received: f64,
    pub valid_pegs_received: Vec<Peg>,
    pub penalty_pegs_given: Vec<Peg>,
}

/// Sender-centric aggregate: who gave how much, penalties included.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GivenSummary {
    pub person_id: String,
    pub person_name: String,
    pub weighted_pegs_received: f64,
    pub valid_pegs_given: usize,
    pub valid_pegs_received: Vec<Peg>,
    pub penalty_pegs_given: Vec<Peg>,
}

impl PersonSummary for ReceivedSummary {
    fn person_id(&self) -> &str {
        &self.person_id
    }

    fn person_name(&self) -> &str {
        &self.person_name
    }

    fn valid_pegs_received(&self) -> &[Peg] {
        &self.valid_pegs_received
    }

    fn penalty_pegs_given(&self) -> &[Peg] {
        &self.penalty_pegs_given
    }

    fn weighted_pegs_received(&self) -> f64 {
        self.weighted_pegs_received
    }
}

impl PersonSummary for GivenSummary {
    fn person_id(&self) -> &str {
        &self.person_id
    }

    fn person_name(&self) -> &str {
        &self.person_name
    }

    fn valid_pegs_received(&self) -> &[Peg] {
        &self.valid_pegs_received
    }

    fn penalty_pegs_given(&self) -> &[Peg] {
        &self.penalty_pegs_given
    }

    fn weighted_pegs_received(&self) -> f64 {
        self.weighted_pegs_received
    }
}

/// Results narrowed to a single keyword.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryBreakdown {
    pub category: String,
    pub results: Vec<ReceivedSummary>,
}

/// Person-to-location lookup plus every configured location name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationDirectory {
    pub by_person: HashMap<String, Option<String>>,
    pub names: Vec<String>,
}

impl LocationDirectory {
    pub fn location_of(&self, person_id: &str) -> Option<&str> {
        self.by_person
            .get(person_id)
            .and_then(|location| location.as_deref())
    }
}
