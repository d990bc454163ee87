use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::weighting::{self, LocationWeights};

pub const REQUIRE_KEYWORDS: &str = "requireKeywords";
pub const KEYWORDS: &str = "keywords";
pub const PENALTY_KEYWORDS: &str = "penaltyKeywords";
pub const MINIMUM_VALID_GIVEN: &str = "minimumValidGiven";
pub const WINNER_COUNT: &str = "winnerCount";
pub const REMOTE_LOCATION_WEIGHTING_DEFAULT: &str = "remoteLocationWeightingDefault";
pub const PEG_LIMIT_PER_CYCLE: &str = "pegLimitPerCycle";

/// One row of the flat settings table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setting {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("required setting `{0}` is missing")]
    Missing(&'static str),
    #[error("setting `{name}` must be {expected}, got `{value}`")]
    Invalid {
        name: String,
        value: String,
        expected: &'static str,
    },
}

/// Settings snapshot for one pipeline run. Never refreshed in place.
#[derive(Debug, Clone, PartialEq)]
pub struct PegConfig {
    pub require_keywords: bool,
    pub keywords: Vec<String>,
    pub penalty_keywords: Vec<String>,
    pub minimum_valid_given: usize,
    pub winner_count: usize,
    pub remote_location_weighting_default: Option<f64>,
    pub peg_limit_per_cycle: Option<usize>,
    pub location_weights: LocationWeights,
}

impl PegConfig {
    /// Builds the snapshot from the settings table. Names match
    /// case-insensitively and later rows win over earlier ones.
    pub fn from_settings(
        settings: &[Setting],
        known_locations: &[String],
    ) -> Result<Self, ConfigError> {
        let by_name: HashMap<String, &Setting> = settings
            .iter()
            .map(|setting| (setting.name.to_lowercase(), setting))
            .collect();
        let lookup = |name: &'static str| by_name.get(&name.to_lowercase()).copied();
        let required = |name: &'static str| lookup(name).ok_or(ConfigError::Missing(name));

        let require_keywords = parse_bool(required(REQUIRE_KEYWORDS)?)?;
        let keywords = parse_list(&required(KEYWORDS)?.value);
        let penalty_keywords = parse_list(&required(PENALTY_KEYWORDS)?.value);
        let minimum_valid_given = parse_count(required(MINIMUM_VALID_GIVEN)?)?;
        let winner_count = parse_count(required(WINNER_COUNT)?)?;
        let remote_location_weighting_default = lookup(REMOTE_LOCATION_WEIGHTING_DEFAULT)
            .map(parse_weight)
            .transpose()?;
        let peg_limit_per_cycle = lookup(PEG_LIMIT_PER_CYCLE).map(parse_count).transpose()?;

        let mut named_weights = Vec::new();
        for setting in settings
            .iter()
            .filter(|setting| weighting::is_weight_key(&setting.name))
        {
            named_weights.push((setting.name.as_str(), parse_weight(setting)?));
        }
        let location_weights = LocationWeights::from_named(named_weights, known_locations);

        Ok(Self {
            require_keywords,
            keywords,
            penalty_keywords,
            minimum_valid_given,
            winner_count,
            remote_location_weighting_default,
            peg_limit_per_cycle,
            location_weights,
        })
    }
}

fn invalid(setting: &Setting, expected: &'static str) -> ConfigError {
    ConfigError::Invalid {
        name: setting.name.clone(),
        value: setting.value.clone(),
        expected,
    }
}

fn parse_bool(setting: &Setting) -> Result<bool, ConfigError> {
    match setting.value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(invalid(setting, "a boolean")),
    }
}

fn parse_count(setting: &Setting) -> Result<usize, ConfigError> {
    setting
        .value
        .trim()
        .parse::<usize>()
        .map_err(|_| invalid(setting, "a non-negative integer"))
}

fn parse_weight(setting: &Setting) -> Result<f64, ConfigError> {
    match setting.value.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
        _ => Err(invalid(setting, "a non-negative number")),
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
