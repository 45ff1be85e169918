use log::debug;
use std::collections::{BTreeMap, BTreeSet};

use super::ScoringPolicy;
use crate::domain::{
    Category, CountedMember, RaceResult, Round, Team, TeamRoundEntry, TeamRoundPoints,
    TeamRoundScore, TeamScope, TeamScore,
};
use crate::error::StandingsError;
use crate::rules::CategoryRules;

/// Whether a result can count for one of this category's teams. Race-scoped
/// teams draw on every category read from the same race.
fn in_pool(result: &RaceResult, category: &Category, rules: &CategoryRules) -> bool {
    match category.team_scope() {
        TeamScope::Category => result.category == category.code,
        TeamScope::Race => rules
            .category(&result.category)
            .is_some_and(|own| rules.same_race(own, category)),
    }
}

/// Placement a finisher scores with for a team.
fn team_placement(result: &RaceResult, category: &Category) -> Option<u32> {
    match category.team_scope() {
        TeamScope::Category => result.placement(),
        TeamScope::Race => result.race_rank,
    }
}

fn counts_for_team(result: &RaceResult, category: &Category, rules: &CategoryRules) -> bool {
    in_pool(result, category, rules)
        && team_placement(result, category).is_some()
        && rules.is_team_eligible(&result.athlete, category)
}

/// A team's placed, team-eligible finishers for one round, best first.
fn eligible_finishers<'a>(
    club: &str,
    category: &Category,
    results: &'a [RaceResult],
    rules: &CategoryRules,
) -> Vec<&'a RaceResult> {
    let mut finishers: Vec<&RaceResult> = results
        .iter()
        .filter(|r| r.athlete.club == club && counts_for_team(r, category, rules))
        .collect();
    finishers.sort_by(|a, b| {
        team_placement(a, category)
            .cmp(&team_placement(b, category))
            .then_with(|| a.athlete.id.cmp(&b.athlete.id))
    });
    finishers
}

/// Teams present in one round of a category: one per club with a
/// team-eligible finisher, or one per filled squad when the category uses
/// squads.
pub fn derive_teams(category: &Category, results: &[RaceResult], rules: &CategoryRules) -> Vec<Team> {
    let Some(size) = rules.scoring_subset_size(category) else {
        return Vec::new();
    };

    let clubs: BTreeSet<&str> = results
        .iter()
        .filter(|r| counts_for_team(r, category, rules))
        .map(|r| r.athlete.club.as_str())
        .collect();

    let mut teams = Vec::new();
    for club in clubs {
        if !rules.uses_squads(category) {
            teams.push(Team::club(club));
            continue;
        }
        let finishers = eligible_finishers(club, category, results, rules).len();
        let squads = finishers.div_ceil(size.max(1));
        for index in 0..squads {
            match Team::squad(club, index) {
                Some(team) => teams.push(team),
                None => {
                    debug!("{} has more squads than letters in {}", club, category.code);
                    break;
                }
            }
        }
    }
    teams
}

/// Score one team for one round.
///
/// Takes the team's best `scoring_subset_size` eligible finishers (its own
/// slice of the club's finishers when squads are used) and sums their
/// points. Race-scoped teams rank and score their runners by position in
/// the whole race. A team with no finishers did not compete and yields `None`.
/// Short teams score what they have unless the category sets a minimum.
pub fn score_team(
    team: &Team,
    category: &Category,
    round: &Round,
    results_for_round: &[RaceResult],
    rules: &CategoryRules,
    policy: &ScoringPolicy,
) -> Result<Option<TeamRoundScore>, StandingsError> {
    let Some(size) = rules.scoring_subset_size(category) else {
        return Ok(None);
    };

    let finishers = eligible_finishers(&team.club, category, results_for_round, rules);
    let start = team.squad_index().unwrap_or(0) * size;
    let counted: Vec<&RaceResult> = finishers.into_iter().skip(start).take(size).collect();

    if counted.is_empty() {
        return Ok(None);
    }

    if let Some(required) = rules.min_team_size(category) {
        if counted.len() < required {
            return Err(StandingsError::InsufficientTeamSize {
                team: team.name(),
                category: category.code.clone(),
                round: round.id.clone(),
                finishers: counted.len(),
                required,
            });
        }
    }

    let members: Vec<CountedMember> = counted
        .iter()
        .filter_map(|r| {
            let placement = team_placement(r, category)?;
            Some(CountedMember {
                athlete_id: r.athlete.id.clone(),
                name: r.athlete.name.clone(),
                placement,
                points: policy.points.points_for(placement),
            })
        })
        .collect();

    Ok(Some(TeamRoundScore {
        team: team.clone(),
        category: category.code.clone(),
        round: round.id.clone(),
        points: members.iter().map(|m| m.points).sum(),
        members,
    }))
}

/// Fold a team's per-round scores over the ordered rounds.
///
/// Rounds missing from `team_scores_by_round` mean the team did not compete
/// and add nothing. A round voided by `InsufficientTeamSize` adds nothing
/// but stays visible in the breakdown.
pub fn aggregate_team(
    team: &Team,
    category: &Category,
    ordered_rounds: &[Round],
    team_scores_by_round: &BTreeMap<String, Result<TeamRoundScore, StandingsError>>,
    rules: &CategoryRules,
    policy: &ScoringPolicy,
) -> TeamScore {
    let rounds: Vec<TeamRoundEntry> = ordered_rounds
        .iter()
        .map(|round| {
            let outcome = match team_scores_by_round.get(&round.id) {
                Some(Ok(score)) => TeamRoundPoints::Scored {
                    points: score.points,
                },
                Some(Err(StandingsError::InsufficientTeamSize {
                    finishers,
                    required,
                    ..
                })) => TeamRoundPoints::Insufficient {
                    finishers: *finishers,
                    required: *required,
                },
                Some(Err(_)) | None => TeamRoundPoints::Absent,
            };
            TeamRoundEntry {
                round: round.id.clone(),
                outcome,
            }
        })
        .collect();

    let round_points: Vec<u32> = rounds.iter().map(|r| r.outcome.points()).collect();
    let name = team.name();

    TeamScore {
        division: rules.division_for(category, &name, &team.club),
        team: team.clone(),
        name,
        category: category.code.clone(),
        total: round_points.iter().sum(),
        counted_total: policy.counted_total(&round_points),
        rounds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LeagueConfig;
    use crate::domain::{Athlete, Outcome, TeamRule, TeamScope};
    use crate::scoring::{PointsBucket, PointsConfig, PointsTable};

    fn athlete(id: &str, club: &str, guest: bool) -> Athlete {
        Athlete {
            id: id.to_string(),
            name: format!("Runner {}", id),
            gender: None,
            club: club.to_string(),
            guest,
        }
    }

    fn finish(id: &str, club: &str, placement: u32) -> RaceResult {
        RaceResult {
            athlete: athlete(id, club, false),
            category: "U13B".to_string(),
            round: Round::new("r1", 0),
            outcome: Outcome::Placed {
                placement,
                tied: false,
            },
            time: None,
            race_rank: Some(placement),
        }
    }

    fn category(scoring_size: usize, min_members: Option<usize>, squads: bool) -> Category {
        Category {
            team: Some(TeamRule {
                scoring_size,
                min_members,
                squads,
                scope: TeamScope::Category,
            }),
            ..Category::individual("U13B")
        }
    }

    fn rules_for(category: &Category) -> CategoryRules {
        let config = LeagueConfig {
            rounds: vec!["r1".to_string(), "r2".to_string()],
            counted_rounds: None,
            points: PointsConfig::default(),
            guests: vec![],
            division_sets: BTreeMap::new(),
            categories: vec![category.clone()],
        };
        CategoryRules::from_config(&config).unwrap()
    }

    fn policy() -> ScoringPolicy {
        ScoringPolicy {
            points: PointsTable::from_config(&PointsConfig::default()).unwrap(),
            counted_rounds: None,
        }
    }

    #[test]
    fn test_team_scores_top_subset() {
        let category = category(3, None, false);
        let rules = rules_for(&category);
        let results: Vec<RaceResult> = ["A", "B", "C", "D", "E"]
            .iter()
            .enumerate()
            .map(|(i, id)| finish(id, "Oxford", i as u32 + 1))
            .collect();

        let team = Team::club("Oxford");
        let score = score_team(&team, &category, &Round::new("r1", 0), &results, &rules, &policy())
            .unwrap()
            .unwrap();

        assert_eq!(score.points, 24);
        let ids: Vec<&str> = score.members.iter().map(|m| m.athlete_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_partial_team_scores_what_it_has() {
        let category = category(4, None, false);
        let rules = rules_for(&category);
        let results = vec![
            finish("A", "Oxford", 1),
            finish("X", "Witney", 2),
            finish("B", "Oxford", 3),
            finish("C", "Oxford", 4),
        ];
        let custom = ScoringPolicy {
            points: PointsTable::from_config(&PointsConfig {
                floor: Some(0),
                table: vec![
                    PointsBucket::new("1", 10),
                    PointsBucket::new("2", 9),
                    PointsBucket::new("3", 8),
                    PointsBucket::new("4", 6),
                ],
            })
            .unwrap(),
            counted_rounds: None,
        };

        let score = score_team(
            &Team::club("Oxford"),
            &category,
            &Round::new("r1", 0),
            &results,
            &rules,
            &custom,
        )
        .unwrap()
        .unwrap();

        // 10 + 8 + 6
        assert_eq!(score.points, 24);
        assert_eq!(score.members.len(), 3);
    }

    #[test]
    fn test_guest_never_counts_for_team() {
        let category = category(2, None, false);
        let rules = rules_for(&category);
        let mut guest = finish("G", "Oxford", 1);
        guest.athlete.guest = true;
        let results = vec![guest, finish("A", "Oxford", 2), finish("B", "Oxford", 3)];

        let score = score_team(
            &Team::club("Oxford"),
            &category,
            &Round::new("r1", 0),
            &results,
            &rules,
            &policy(),
        )
        .unwrap()
        .unwrap();

        assert!(score.members.iter().all(|m| m.athlete_id != "G"));
        assert_eq!(score.points, 8 + 6);
    }

    #[test]
    fn test_team_without_finishers_is_absent() {
        let category = category(3, None, false);
        let rules = rules_for(&category);
        let results = vec![finish("A", "Oxford", 1)];

        let score = score_team(
            &Team::club("Witney"),
            &category,
            &Round::new("r1", 0),
            &results,
            &rules,
            &policy(),
        )
        .unwrap();
        assert!(score.is_none());
    }

    #[test]
    fn test_min_members_enforced() {
        let category = category(3, Some(2), false);
        let rules = rules_for(&category);
        let results = vec![finish("A", "Oxford", 1)];

        let err = score_team(
            &Team::club("Oxford"),
            &category,
            &Round::new("r1", 0),
            &results,
            &rules,
            &policy(),
        )
        .unwrap_err();

        assert_eq!(
            err,
            StandingsError::InsufficientTeamSize {
                team: "Oxford".to_string(),
                category: "U13B".to_string(),
                round: "r1".to_string(),
                finishers: 1,
                required: 2,
            }
        );
    }

    #[test]
    fn test_squads_split_club_in_placement_order() {
        let category = category(2, None, true);
        let rules = rules_for(&category);
        let results: Vec<RaceResult> = (1..=5)
            .map(|p| finish(&format!("O{}", p), "Oxford", p))
            .collect();

        let teams = derive_teams(&category, &results, &rules);
        let names: Vec<String> = teams.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["Oxford A", "Oxford B", "Oxford C"]);

        let round = Round::new("r1", 0);
        let b = score_team(&teams[1], &category, &round, &results, &rules, &policy())
            .unwrap()
            .unwrap();
        let ids: Vec<&str> = b.members.iter().map(|m| m.athlete_id.as_str()).collect();
        assert_eq!(ids, vec!["O3", "O4"]);

        let c = score_team(&teams[2], &category, &round, &results, &rules, &policy())
            .unwrap()
            .unwrap();
        assert_eq!(c.members.len(), 1);
    }

    #[test]
    fn test_derive_teams_skips_guests_and_unattached() {
        let category = category(3, None, false);
        let rules = rules_for(&category);
        let mut guest = finish("G", "Guests RC", 1);
        guest.athlete.guest = true;
        let results = vec![guest, finish("U", "", 2), finish("A", "Oxford", 3)];

        let teams = derive_teams(&category, &results, &rules);
        assert_eq!(teams, vec![Team::club("Oxford")]);
    }

    #[test]
    fn test_race_scope_pools_every_category_of_the_race() {
        let senior = |code: &str, scope: Option<TeamScope>| Category {
            race: Some("Men".to_string()),
            team: scope.map(|scope| TeamRule {
                scoring_size: 3,
                min_members: None,
                squads: false,
                scope,
            }),
            ..Category::individual(code)
        };
        let in_category = |id: &str, code: &str, placement: u32, race_rank: u32| RaceResult {
            category: code.to_string(),
            race_rank: Some(race_rank),
            ..finish(id, "Oxford", placement)
        };
        let results = vec![
            in_category("A", "SM", 1, 1),
            in_category("V", "MV40", 1, 2),
            in_category("B", "SM", 2, 3),
            in_category("W", "U13B", 1, 1),
        ];
        let mut u13b = category(3, None, false);
        u13b.race = Some("U13".to_string());
        let race_wide = senior("SM", Some(TeamScope::Race));
        let config = LeagueConfig {
            rounds: vec!["r1".to_string()],
            counted_rounds: None,
            points: PointsConfig::default(),
            guests: vec![],
            division_sets: BTreeMap::new(),
            categories: vec![race_wide.clone(), senior("MV40", None), u13b],
        };
        let rules = CategoryRules::from_config(&config).unwrap();
        let round = Round::new("r1", 0);

        assert_eq!(derive_teams(&race_wide, &results, &rules), vec![Team::club("Oxford")]);
        let oxford = Team::club("Oxford");
        let score = score_team(&oxford, &race_wide, &round, &results, &rules, &policy())
            .unwrap()
            .unwrap();
        let counted: Vec<(&str, u32)> = score
            .members
            .iter()
            .map(|m| (m.athlete_id.as_str(), m.placement))
            .collect();
        assert_eq!(counted, vec![("A", 1), ("V", 2), ("B", 3)]);
        assert_eq!(score.points, 10 + 8 + 6);

        let own_category = senior("SM", Some(TeamScope::Category));
        let score = score_team(&oxford, &own_category, &round, &results, &rules, &policy())
            .unwrap()
            .unwrap();
        assert_eq!(score.points, 10 + 8);
    }

    #[test]
    fn test_aggregate_team_sums_rounds_in_order() {
        let category = category(3, Some(2), false);
        let rules = rules_for(&category);
        let rounds = Round::sequence(&["r1", "r2", "r3"]);
        let team = Team::club("Oxford");

        let mut by_round = BTreeMap::new();
        by_round.insert(
            "r1".to_string(),
            Ok(TeamRoundScore {
                team: team.clone(),
                category: "U13B".to_string(),
                round: "r1".to_string(),
                members: vec![],
                points: 24,
            }),
        );
        by_round.insert(
            "r3".to_string(),
            Err(StandingsError::InsufficientTeamSize {
                team: "Oxford".to_string(),
                category: "U13B".to_string(),
                round: "r3".to_string(),
                finishers: 1,
                required: 2,
            }),
        );

        let total = aggregate_team(&team, &category, &rounds, &by_round, &rules, &policy());
        assert_eq!(total.total, 24);
        assert_eq!(total.rounds[0].outcome, TeamRoundPoints::Scored { points: 24 });
        assert_eq!(total.rounds[1].outcome, TeamRoundPoints::Absent);
        assert_eq!(
            total.rounds[2].outcome,
            TeamRoundPoints::Insufficient {
                finishers: 1,
                required: 2
            }
        );
        assert_eq!(total.division, None);
    }
}
