use log::debug;
use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap, HashSet};

use super::parse::{parse_outcome, parse_time};
use crate::domain::athlete::normalize_text;
use crate::domain::{Athlete, Gender, Outcome, RaceResult, Round};
use crate::error::StandingsError;
use crate::rules::CategoryRules;

/// One raw result row as delivered by an input adapter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    pub athlete_id: String,
    pub name: String,
    pub gender: String,
    pub club: String,
    pub category_label: String,
    pub placement_or_status: String,
    pub time: String,
}

/// All rows of one race file for one round. `rows` carries the adapter's
/// failure when the file could not be read.
#[derive(Debug, Clone)]
pub struct RawUnit {
    pub round: String,
    pub race: String,
    pub rows: Result<Vec<RawRow>, StandingsError>,
}

/// Turn one race file's raw rows into validated race results.
///
/// Fails fast: the first bad row rejects the whole unit so that standings
/// never silently miss entrants. Scoring placements are renumbered per
/// category once guests are set aside (see [`rerank`]).
pub fn process(
    round: &Round,
    race: &str,
    rows: &[RawRow],
    rules: &CategoryRules,
) -> Result<Vec<RaceResult>, StandingsError> {
    let mut athletes: HashMap<String, Athlete> = HashMap::new();
    let mut entered: HashSet<(String, String)> = HashSet::new();
    let mut placements: HashMap<(String, u32), (String, bool)> = HashMap::new();
    let mut results = Vec::with_capacity(rows.len());

    for (i, row) in rows.iter().enumerate() {
        let line = i + 1;
        let malformed = |reason: String| StandingsError::malformed(line, reason);

        let id = normalize_text(&row.athlete_id);
        if id.is_empty() {
            return Err(malformed("missing athlete identifier".to_string()));
        }
        let name = normalize_text(&row.name);
        if name.is_empty() {
            return Err(malformed(format!("athlete {} has no name", id)));
        }

        let gender = Gender::parse(&row.gender).map_err(&malformed)?;
        let category = rules.canonicalize(&row.category_label, gender, race)?;
        let outcome = parse_outcome(&row.placement_or_status).map_err(&malformed)?;
        let time = parse_time(&row.time).map_err(&malformed)?;

        let athlete = athletes
            .entry(id.clone())
            .or_insert_with(|| Athlete {
                id: id.clone(),
                name,
                gender: gender.or(category.gender),
                club: normalize_text(&row.club),
                guest: rules.is_guest(&id),
            })
            .clone();

        if !entered.insert((category.code.clone(), id.clone())) {
            return Err(malformed(format!(
                "athlete {} appears twice in {}",
                id, category.code
            )));
        }

        if let Outcome::Placed { placement, tied } = outcome {
            if rules.is_scoring_eligible(&athlete) {
                match placements.entry((category.code.clone(), placement)) {
                    Entry::Occupied(existing) => {
                        let (first, first_tied) = existing.get();
                        if !(tied && *first_tied) {
                            return Err(StandingsError::DuplicatePlacement {
                                category: category.code.clone(),
                                placement,
                                first: first.clone(),
                                second: id,
                            });
                        }
                    }
                    Entry::Vacant(slot) => {
                        slot.insert((id.clone(), tied));
                    }
                }
            }
        }

        results.push(RaceResult {
            athlete,
            category: category.code.clone(),
            round: round.clone(),
            outcome,
            time,
            race_rank: None,
        });
    }

    rerank(&mut results, rules);

    results.sort_by(|a, b| {
        a.category
            .cmp(&b.category)
            .then_with(|| match (a.placement(), b.placement()) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            })
            .then_with(|| a.athlete.id.cmp(&b.athlete.id))
    });

    debug!(
        "Processed {} rows for {} {} ({} athletes)",
        rows.len(),
        round,
        race,
        athletes.len()
    );

    Ok(results)
}

/// Renumber scoring placements densely within each category, skipping the
/// places guests took, and rank every scoring finisher across the race.
///
/// Declared ties keep sharing a place and the next finisher takes the next
/// one ("1, 2=, 2=, 3"). Guests keep their printed placement.
fn rerank(results: &mut [RaceResult], rules: &CategoryRules) {
    let mut by_category: HashMap<String, BTreeSet<u32>> = HashMap::new();
    let mut race_wide: BTreeSet<u32> = BTreeSet::new();
    for result in results.iter() {
        if let Some(placement) = result.placement() {
            if rules.is_scoring_eligible(&result.athlete) {
                by_category
                    .entry(result.category.clone())
                    .or_default()
                    .insert(placement);
                race_wide.insert(placement);
            }
        }
    }

    let dense =
        |printed: &BTreeSet<u32>, placement: u32| printed.range(..placement).count() as u32 + 1;
    for result in results.iter_mut() {
        let Outcome::Placed { placement, tied } = result.outcome else {
            continue;
        };
        if !rules.is_scoring_eligible(&result.athlete) {
            continue;
        }
        result.race_rank = Some(dense(&race_wide, placement));
        if let Some(printed) = by_category.get(&result.category) {
            result.outcome = Outcome::Placed {
                placement: dense(printed, placement),
                tied,
            };
        }
    }
}

/// Check one category's results for a round after every race file feeding
/// it has been merged. Each file passed [`process`] on its own, so this only
/// catches clashes between files.
pub fn check_round(
    category: &str,
    results: &[RaceResult],
    rules: &CategoryRules,
) -> Result<(), StandingsError> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut placements: HashMap<u32, (&str, bool)> = HashMap::new();

    for result in results {
        let id = result.athlete.id.as_str();
        if !seen.insert(id) {
            return Err(StandingsError::DuplicateAthlete {
                athlete: id.to_string(),
                category: category.to_string(),
            });
        }

        let Outcome::Placed { placement, tied } = result.outcome else {
            continue;
        };
        if !rules.is_scoring_eligible(&result.athlete) {
            continue;
        }
        match placements.entry(placement) {
            Entry::Occupied(existing) => {
                let (first, first_tied) = *existing.get();
                if !(tied && first_tied) {
                    return Err(StandingsError::DuplicatePlacement {
                        category: category.to_string(),
                        placement,
                        first: first.to_string(),
                        second: id.to_string(),
                    });
                }
            }
            Entry::Vacant(slot) => {
                slot.insert((id, tied));
            }
        }
    }
    Ok(())
}
