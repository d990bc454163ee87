use crate::config::PegConfig;
use crate::keywords;
use crate::models::{LocationDirectory, Peg, RawPegEvent};
use crate::validation;

/// Classifies and weights every raw event, one peg per event, in input order.
pub fn enrich(
    events: &[RawPegEvent],
    config: &PegConfig,
    locations: &LocationDirectory,
) -> Vec<Peg> {
    events
        .iter()
        .map(|event| enrich_one(event, config, locations))
        .collect()
}

fn enrich_one(event: &RawPegEvent, config: &PegConfig, locations: &LocationDirectory) -> Peg {
    let is_valid = validation::is_valid(
        &event.comment,
        config.require_keywords,
        &config.keywords,
        &config.penalty_keywords,
    );
    // Tags are kept on penalty pegs too so reports can show them.
    let categories = keywords::extract_categories(&event.comment, &config.keywords);
    let sender_location = locations.location_of(&event.sender_id).map(str::to_string);
    let receiver_location = locations.location_of(&event.receiver_id).map(str::to_string);

    let peg_weighting = if is_valid {
        config.location_weights.resolve(
            sender_location.as_deref(),
            receiver_location.as_deref(),
            config.remote_location_weighting_default,
        )
    } else {
        0.0
    };

    Peg {
        receiver_id: event.receiver_id.clone(),
        receiver_name: event.receiver_name.clone(),
        sender_id: event.sender_id.clone(),
        sender_name: event.sender_name.clone(),
        comment: event.comment.clone(),
        categories,
        is_valid,
        peg_weighting,
        sender_location,
        receiver_location,
    }
}
