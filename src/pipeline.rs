use anyhow::{bail, Context, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::config::LeagueConfig;
use crate::domain::{
    Athlete, Category, RaceResult, Round, Score, Team, TeamRoundScore, TeamScope, TeamScore,
};
use crate::error::{ErrorKind, StandingsError};
use crate::processing::race::check_round;
use crate::processing::{process, RawUnit};
use crate::rules::CategoryRules;
use crate::scoring::{
    aggregate, aggregate_team, derive_teams, rank_scores, rank_teams, score_team, Ranked,
    ScoringPolicy,
};

/// Finished standings for every category that computed cleanly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Standings {
    pub rounds: Vec<String>,
    pub categories: BTreeMap<String, CategoryStandings>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStandings {
    pub code: String,
    pub name: String,
    pub individual: Vec<Ranked<Score>>,
    pub teams: Vec<Ranked<TeamScore>>,
    /// Per-round team results with the runners who counted
    pub team_rounds: Vec<TeamRoundScore>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UnitStatus {
    Succeeded { results: usize },
    Failed { kind: ErrorKind, message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitReport {
    pub round: String,
    pub race: String,
    #[serde(flatten)]
    pub status: UnitStatus,
}

/// A category left out of the standings because one of its race units
/// failed, or because the files feeding one of its rounds clash.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct WithheldCategory {
    pub category: String,
    pub round: String,
    pub race: String,
    pub kind: ErrorKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamFailure {
    pub category: String,
    pub team: String,
    pub round: String,
    pub kind: ErrorKind,
    pub message: String,
}

/// What succeeded and what failed during a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunManifest {
    pub units: Vec<UnitReport>,
    pub withheld: Vec<WithheldCategory>,
    pub team_failures: Vec<TeamFailure>,
}

impl RunManifest {
    pub fn failed_units(&self) -> impl Iterator<Item = &UnitReport> {
        self.units
            .iter()
            .filter(|u| matches!(u.status, UnitStatus::Failed { .. }))
    }

    pub fn is_clean(&self) -> bool {
        self.failed_units().next().is_none() && self.withheld.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub standings: Standings,
    pub manifest: RunManifest,
}

/// Resolve the requested round ids against the configured order. `None`
/// means every configured round.
pub fn resolve_rounds(config: &LeagueConfig, requested: Option<&[String]>) -> Result<Vec<Round>> {
    let all = Round::sequence(&config.rounds);
    let Some(requested) = requested else {
        return Ok(all);
    };

    for id in requested {
        if !config.rounds.contains(id) {
            bail!(
                "Round '{}' is not configured (known rounds: {})",
                id,
                config.rounds.join(", ")
            );
        }
    }

    Ok(all
        .into_iter()
        .filter(|round| requested.contains(&round.id))
        .collect())
}

/// Process every input unit, aggregate every category and report what
/// succeeded.
///
/// Units (one race file of one round) are processed concurrently on the
/// blocking pool, then each category is aggregated concurrently over the
/// ordered rounds. A failed unit withholds the categories read from its race
/// rather than letting them appear with a round missing.
pub async fn run(
    config: &LeagueConfig,
    units: Vec<RawUnit>,
    requested: Option<&[String]>,
) -> Result<RunReport> {
    let rules = Arc::new(CategoryRules::from_config(config)?);
    let policy = Arc::new(ScoringPolicy::from_config(config)?);
    let rounds = resolve_rounds(config, requested)?;

    let mut futures = FuturesUnordered::new();
    for unit in units {
        let Some(round) = rounds.iter().find(|r| r.id == unit.round).cloned() else {
            debug!("Skipping {} {}: round not requested", unit.round, unit.race);
            continue;
        };
        let rules = Arc::clone(&rules);
        futures.push(async move {
            let race = unit.race;
            let task_round = round.clone();
            let task_race = race.clone();
            let result = match unit.rows {
                Ok(rows) => tokio::task::spawn_blocking(move || {
                    process(&task_round, &task_race, &rows, &rules)
                })
                .await
                .context("Race processing task panicked"),
                Err(e) => Ok(Err(e)),
            };
            (round, race, result)
        });
    }

    let mut manifest = RunManifest::default();
    let mut failed: Vec<(Round, String, StandingsError)> = Vec::new();
    let mut by_category: BTreeMap<String, BTreeMap<String, Vec<RaceResult>>> = BTreeMap::new();
    let mut sources: BTreeMap<(String, String), BTreeSet<String>> = BTreeMap::new();
    let mut reports: Vec<(usize, UnitReport)> = Vec::new();

    while let Some((round, race, result)) = futures.next().await {
        match result? {
            Ok(results) => {
                info!("Processed {} {}: {} results", round, race, results.len());
                reports.push((
                    round.ordinal,
                    UnitReport {
                        round: round.id.clone(),
                        race: race.clone(),
                        status: UnitStatus::Succeeded {
                            results: results.len(),
                        },
                    },
                ));
                for result in results {
                    sources
                        .entry((result.category.clone(), round.id.clone()))
                        .or_default()
                        .insert(race.clone());
                    by_category
                        .entry(result.category.clone())
                        .or_default()
                        .entry(round.id.clone())
                        .or_default()
                        .push(result);
                }
            }
            Err(e) => {
                warn!("Failed {} {}: {}", round, race, e);
                reports.push((
                    round.ordinal,
                    UnitReport {
                        round: round.id.clone(),
                        race: race.clone(),
                        status: UnitStatus::Failed {
                            kind: e.kind(),
                            message: e.to_string(),
                        },
                    },
                ));
                failed.push((round, race, e));
            }
        }
    }

    reports.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.race.cmp(&b.1.race)));
    manifest.units = reports.into_iter().map(|(_, report)| report).collect();

    // Two files of the same round may feed one category; keep a stable order
    for per_round in by_category.values_mut() {
        for results in per_round.values_mut() {
            results.sort_by(|a, b| {
                a.placement()
                    .is_none()
                    .cmp(&b.placement().is_none())
                    .then_with(|| a.placement().cmp(&b.placement()))
                    .then_with(|| a.athlete.id.cmp(&b.athlete.id))
            });
        }
    }

    let mut withheld = BTreeSet::new();
    for (round, race, error) in &failed {
        let mut affected: Vec<&Category> = rules.categories_for_race(race).collect();
        if affected.is_empty() {
            warn!(
                "{} {} matches no category's race; withholding every category",
                round, race
            );
            affected = rules.categories().iter().collect();
        }
        for category in affected {
            withheld.insert(WithheldCategory {
                category: category.code.clone(),
                round: round.id.clone(),
                race: race.clone(),
                kind: error.kind(),
            });
        }
    }

    for (code, per_round) in &by_category {
        for (round, results) in per_round {
            if let Err(e) = check_round(code, results, &rules) {
                let races = sources
                    .get(&(code.clone(), round.clone()))
                    .map(|r| r.iter().cloned().collect::<Vec<_>>().join("+"))
                    .unwrap_or_default();
                warn!("Failed {} {} ({}): {}", code, round, races, e);
                withheld.insert(WithheldCategory {
                    category: code.clone(),
                    round: round.clone(),
                    race: races,
                    kind: e.kind(),
                });
            }
        }
    }

    // Race-wide teams cannot score without every category of their race
    let mut spread = Vec::new();
    for category in rules.categories() {
        if category.team_scope() != TeamScope::Race {
            continue;
        }
        for entry in &withheld {
            let sibling = rules
                .category(&entry.category)
                .is_some_and(|c| rules.same_race(c, category));
            if sibling && entry.category != category.code {
                spread.push(WithheldCategory {
                    category: category.code.clone(),
                    ..entry.clone()
                });
            }
        }
    }
    withheld.extend(spread);
    manifest.withheld = withheld.into_iter().collect();

    let withheld_codes: BTreeSet<&str> = manifest
        .withheld
        .iter()
        .map(|w| w.category.as_str())
        .collect();

    let roster = Arc::new(build_roster(&rounds, &by_category));
    let rounds = Arc::new(rounds);

    let mut aggregations = FuturesUnordered::new();
    for (code, by_round) in &by_category {
        if withheld_codes.contains(code.as_str()) {
            debug!("Withholding {} standings", code);
            continue;
        }
        let Some(category) = rules.category(code).cloned() else {
            continue;
        };
        let team_pool = team_pool(&category, by_round, &by_category, &rules);
        let by_round = by_round.clone();
        let rules = Arc::clone(&rules);
        let policy = Arc::clone(&policy);
        let roster = Arc::clone(&roster);
        let rounds = Arc::clone(&rounds);
        aggregations.push(tokio::task::spawn_blocking(move || {
            build_category(&category, &rounds, &by_round, &team_pool, &roster, &rules, &policy)
        }));
    }

    let mut categories = BTreeMap::new();
    let mut team_failures = Vec::new();
    while let Some(joined) = aggregations.next().await {
        let (standings, failures) = joined.context("Aggregation task panicked")?;
        team_failures.extend(failures);
        categories.insert(standings.code.clone(), standings);
    }

    team_failures.sort_by(|a: &TeamFailure, b: &TeamFailure| {
        (&a.category, &a.round, &a.team).cmp(&(&b.category, &b.round, &b.team))
    });
    manifest.team_failures = team_failures;

    Ok(RunReport {
        standings: Standings {
            rounds: rounds.iter().map(|r| r.id.clone()).collect(),
            categories,
        },
        manifest,
    })
}

/// First-seen record of every athlete, walking rounds in order.
fn build_roster(
    rounds: &[Round],
    by_category: &BTreeMap<String, BTreeMap<String, Vec<RaceResult>>>,
) -> BTreeMap<String, Athlete> {
    let mut roster = BTreeMap::new();
    for round in rounds {
        for per_round in by_category.values() {
            for result in per_round.get(&round.id).into_iter().flatten() {
                roster
                    .entry(result.athlete.id.clone())
                    .or_insert_with(|| result.athlete.clone());
            }
        }
    }
    roster
}

/// Results a category's teams draw on, per round. Race-scoped teams see
/// every category read from the same race.
fn team_pool(
    category: &Category,
    by_round: &BTreeMap<String, Vec<RaceResult>>,
    by_category: &BTreeMap<String, BTreeMap<String, Vec<RaceResult>>>,
    rules: &CategoryRules,
) -> BTreeMap<String, Vec<RaceResult>> {
    if category.team_scope() != TeamScope::Race {
        return by_round.clone();
    }

    let mut pool: BTreeMap<String, Vec<RaceResult>> = BTreeMap::new();
    for (code, per_round) in by_category {
        let sibling = rules
            .category(code)
            .is_some_and(|c| rules.same_race(c, category));
        if !sibling {
            continue;
        }
        for (round, results) in per_round {
            pool.entry(round.clone())
                .or_default()
                .extend(results.iter().cloned());
        }
    }
    pool
}

fn build_category(
    category: &Category,
    rounds: &[Round],
    by_round: &BTreeMap<String, Vec<RaceResult>>,
    team_pool: &BTreeMap<String, Vec<RaceResult>>,
    roster: &BTreeMap<String, Athlete>,
    rules: &CategoryRules,
    policy: &ScoringPolicy,
) -> (CategoryStandings, Vec<TeamFailure>) {
    let athlete_ids: BTreeSet<&str> = by_round
        .values()
        .flatten()
        .map(|r| r.athlete.id.as_str())
        .collect();

    let scores: Vec<Score> = athlete_ids
        .into_iter()
        .filter_map(|id| roster.get(id))
        .filter(|athlete| rules.in_individual_standings(athlete, category))
        .map(|athlete| aggregate(athlete, category, rounds, by_round, policy))
        .collect();

    let mut failures = Vec::new();
    let mut team_rounds = Vec::new();
    let mut by_team: BTreeMap<Team, BTreeMap<String, Result<TeamRoundScore, StandingsError>>> =
        BTreeMap::new();

    if category.is_team_category() {
        for round in rounds {
            let Some(results) = team_pool.get(&round.id) else {
                continue;
            };
            for team in derive_teams(category, results, rules) {
                match score_team(&team, category, round, results, rules, policy) {
                    Ok(Some(score)) => {
                        team_rounds.push(score.clone());
                        by_team
                            .entry(team)
                            .or_default()
                            .insert(round.id.clone(), Ok(score));
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!("{}", e);
                        failures.push(TeamFailure {
                            category: category.code.clone(),
                            team: team.name(),
                            round: round.id.clone(),
                            kind: e.kind(),
                            message: e.to_string(),
                        });
                        by_team
                            .entry(team)
                            .or_default()
                            .insert(round.id.clone(), Err(e));
                    }
                }
            }
        }
    }

    let teams: Vec<TeamScore> = by_team
        .iter()
        .map(|(team, per_round)| aggregate_team(team, category, rounds, per_round, rules, policy))
        .collect();

    let ordinal = |id: &str| rounds.iter().position(|r| r.id == id);
    team_rounds.sort_by(|a, b| {
        ordinal(&a.round)
            .cmp(&ordinal(&b.round))
            .then_with(|| b.points.cmp(&a.points))
            .then_with(|| a.team.cmp(&b.team))
    });

    (
        CategoryStandings {
            code: category.code.clone(),
            name: category.display_name().to_string(),
            individual: rank_scores(scores),
            teams: rank_teams(teams),
            team_rounds,
        },
        failures,
    )
}
