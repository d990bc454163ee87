use std::collections::HashMap;

use tracing::warn;

/// Weight for pegs where a location is unknown or both people share one.
pub const NEUTRAL_WEIGHT: f64 = 1.0;
/// Cross-location weight used when neither the table nor the settings say otherwise.
pub const FALLBACK_REMOTE_WEIGHT: f64 = 2.0;

const KEY_PREFIX: &str = "locationweight";

/// Unordered, case-folded pair of location names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocationPair {
    low: String,
    high: String,
}

impl LocationPair {
    pub fn new(a: &str, b: &str) -> Self {
        let a = a.to_lowercase();
        let b = b.to_lowercase();
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }
}

/// Symmetric sender/receiver location weight table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationWeights {
    entries: HashMap<LocationPair, f64>,
}

impl LocationWeights {
    /// Builds the table from flat `locationWeight<A>to<B>` settings. Names that
    /// are not weight keys are ignored.
    pub fn from_named<'a, I>(named: I, known_locations: &[String]) -> Self
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut weights = Self::default();
        for (name, weight) in named {
            if !is_weight_key(name) {
                continue;
            }
            let Some((a, b)) = split_weight_key(name, known_locations) else {
                warn!(setting = name, "ambiguous location weight key, skipping");
                continue;
            };
            if let Some(previous) = weights.insert(a, b, weight) {
                if previous != weight {
                    warn!(
                        setting = name,
                        previous,
                        weight,
                        "conflicting weights for one location pair, keeping the later"
                    );
                }
            }
        }
        weights
    }

    /// Returns the weight this pair held before, if any.
    pub fn insert(&mut self, a: &str, b: &str, weight: f64) -> Option<f64> {
        self.entries.insert(LocationPair::new(a, b), weight)
    }

    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        self.entries.get(&LocationPair::new(a, b)).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Multiplier for a valid peg between two locations.
    ///
    /// Callers short-circuit invalid pegs to zero before calling this.
    pub fn resolve(
        &self,
        sender_location: Option<&str>,
        receiver_location: Option<&str>,
        default_weight: Option<f64>,
    ) -> f64 {
        let (Some(sender), Some(receiver)) = (sender_location, receiver_location) else {
            return NEUTRAL_WEIGHT;
        };
        if sender.to_lowercase() == receiver.to_lowercase() {
            return NEUTRAL_WEIGHT;
        }

        self.get(sender, receiver)
            .unwrap_or_else(|| default_weight.unwrap_or(FALLBACK_REMOTE_WEIGHT))
    }
}

pub fn is_weight_key(name: &str) -> bool {
    name.get(..KEY_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(KEY_PREFIX))
}

/// Splits `locationWeight<A>to<B>` into its two location names.
///
/// Location names may themselves contain "to", so every split point is tried.
/// A split whose halves are both known locations is preferred; otherwise the
/// key is only accepted when exactly one split exists.
pub fn split_weight_key<'a>(name: &'a str, known_locations: &[String]) -> Option<(&'a str, &'a str)> {
    if !is_weight_key(name) {
        return None;
    }
    let pair = &name[KEY_PREFIX.len()..];
    let folded = pair.to_ascii_lowercase();

    let candidates: Vec<(&str, &str)> = folded
        .match_indices("to")
        .map(|(index, _)| index)
        .filter(|&index| index > 0 && index + 2 < pair.len())
        .map(|index| (&pair[..index], &pair[index + 2..]))
        .collect();

    let is_known = |location: &str| {
        known_locations
            .iter()
            .any(|known| known.to_lowercase() == location.to_lowercase())
    };

    if let Some(&found) = candidates
        .iter()
        .find(|(a, b)| is_known(*a) && is_known(*b))
    {
        return Some(found);
    }

    match candidates.as_slice() {
        [only] => Some(*only),
        _ => None,
    }
}
