use std::collections::{HashMap, HashSet};

use super::config::PointsConfig;
use super::points::PointsTable;
use super::range::RangeOp;
use crate::config::LeagueConfig;
use crate::domain::Gender;
use crate::rules::{label_key, GuestList};

fn validate_points(points: &PointsConfig, errors: &mut Vec<String>) {
    let mut ranges_ok = true;
    for (i, bucket) in points.table.iter().enumerate() {
        if let Err(e) = RangeOp::parse(&bucket.range) {
            ranges_ok = false;
            errors.push(format!(
                "points.table[{}].range: invalid '{}' - {}",
                i, bucket.range, e
            ));
        }
    }

    if !ranges_ok {
        return;
    }

    if let Ok(table) = PointsTable::from_config(points) {
        if let Some(placement) = table.first_increase() {
            errors.push(format!(
                "points: placement {} earns more than placement {} (points must not increase with placement)",
                placement,
                placement - 1
            ));
        }
    }
}

/// Validate league configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_league(config: &LeagueConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if config.rounds.is_empty() {
        errors.push("rounds: at least one round is required".to_string());
    }
    let mut seen_rounds = HashSet::new();
    for round in &config.rounds {
        if round.trim().is_empty() {
            errors.push("rounds: round identifiers must not be empty".to_string());
        } else if !seen_rounds.insert(round.as_str()) {
            errors.push(format!("rounds: '{}' is listed twice", round));
        }
    }

    if config.counted_rounds == Some(0) {
        errors.push("counted_rounds: must be at least 1".to_string());
    }

    validate_points(&config.points, &mut errors);

    if let Err(e) = GuestList::parse(&config.guests) {
        errors.push(format!("guests: {}", e));
    }

    let mut codes = HashSet::new();
    let mut labels: HashMap<(Option<Gender>, String), &str> = HashMap::new();
    for (i, category) in config.categories.iter().enumerate() {
        if category.code.trim().is_empty() {
            errors.push(format!("categories[{}].code: must not be empty", i));
        } else if !codes.insert(category.code.as_str()) {
            errors.push(format!(
                "categories[{}].code: '{}' is defined twice",
                i, category.code
            ));
        }

        for label in std::iter::once(&category.code).chain(category.labels.iter()) {
            let key = (category.gender, label_key(label));
            match labels.get(&key) {
                Some(owner) if *owner != category.code => errors.push(format!(
                    "categories[{}].labels: '{}' already maps to {}",
                    i, label, owner
                )),
                _ => {
                    labels.insert(key, category.code.as_str());
                }
            }
        }

        if let Some(ref team) = category.team {
            if team.scoring_size == 0 {
                errors.push(format!(
                    "categories[{}].team.scoring_size: must be at least 1",
                    i
                ));
            }
            if let Some(min) = team.min_members {
                if min > team.scoring_size {
                    errors.push(format!(
                        "categories[{}].team.min_members: {} exceeds scoring_size {}",
                        i, min, team.scoring_size
                    ));
                }
            }
        }

        if let Some(ref set) = category.division_set {
            if !config.division_sets.contains_key(set) {
                errors.push(format!(
                    "categories[{}].division_set: unknown set '{}'",
                    i, set
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
