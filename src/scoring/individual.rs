use std::collections::BTreeMap;

use super::ScoringPolicy;
use crate::domain::{Athlete, Category, Outcome, RaceResult, Round, RoundEntry, RoundPoints, Score};

/// Fold one athlete's results over the ordered rounds into a cumulative
/// score.
///
/// `results_by_round` holds the category's results keyed by round id. A
/// round the athlete did not start is recorded as `Absent` and adds nothing.
/// Pure: the same inputs always give the same score.
pub fn aggregate(
    athlete: &Athlete,
    category: &Category,
    ordered_rounds: &[Round],
    results_by_round: &BTreeMap<String, Vec<RaceResult>>,
    policy: &ScoringPolicy,
) -> Score {
    let rounds: Vec<RoundEntry> = ordered_rounds
        .iter()
        .map(|round| {
            let result = results_by_round
                .get(&round.id)
                .and_then(|results| results.iter().find(|r| r.athlete.id == athlete.id));

            let outcome = match result.map(|r| r.outcome) {
                Some(Outcome::Placed { placement, .. }) => RoundPoints::Scored {
                    points: policy.points.points_for(placement),
                },
                Some(Outcome::Unplaced(status)) => RoundPoints::Unplaced { status },
                None => RoundPoints::Absent,
            };

            RoundEntry {
                round: round.id.clone(),
                outcome,
            }
        })
        .collect();

    let round_points: Vec<u32> = rounds.iter().map(|r| r.outcome.points()).collect();

    Score {
        athlete: athlete.clone(),
        category: category.code.clone(),
        total: round_points.iter().sum(),
        counted_total: policy.counted_total(&round_points),
        rounds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Status;
    use crate::scoring::{PointsConfig, PointsTable};

    fn athlete(id: &str) -> Athlete {
        Athlete {
            id: id.to_string(),
            name: format!("Runner {}", id),
            gender: None,
            club: "Club".to_string(),
            guest: false,
        }
    }

    fn result(id: &str, round: &Round, outcome: Outcome) -> RaceResult {
        RaceResult {
            athlete: athlete(id),
            category: "U13B".to_string(),
            round: round.clone(),
            outcome,
            time: None,
            race_rank: None,
        }
    }

    fn placed(placement: u32) -> Outcome {
        Outcome::Placed {
            placement,
            tied: false,
        }
    }

    fn policy(counted_rounds: Option<usize>) -> ScoringPolicy {
        ScoringPolicy {
            points: PointsTable::from_config(&PointsConfig::default()).unwrap(),
            counted_rounds,
        }
    }

    #[test]
    fn test_single_round_points() {
        let rounds = Round::sequence(&["r1"]);
        let mut by_round = BTreeMap::new();
        by_round.insert(
            "r1".to_string(),
            (1..=5)
                .map(|p| result(&p.to_string(), &rounds[0], placed(p)))
                .collect::<Vec<_>>(),
        );

        let category = Category::with_team("U13B", 3);
        let score = aggregate(&athlete("5"), &category, &rounds, &by_round, &policy(None));
        assert_eq!(score.total, 4);
        assert_eq!(score.points_in("r1"), Some(&RoundPoints::Scored { points: 4 }));
    }

    #[test]
    fn test_absent_round_is_not_zero_points() {
        let rounds = Round::sequence(&["r1", "r2", "r3"]);
        let mut by_round = BTreeMap::new();
        by_round.insert("r1".to_string(), vec![result("A", &rounds[0], placed(1))]);
        by_round.insert(
            "r3".to_string(),
            vec![result("A", &rounds[2], Outcome::Unplaced(Status::Dnf))],
        );

        let category = Category::individual("U13B");
        let score = aggregate(&athlete("A"), &category, &rounds, &by_round, &policy(None));

        assert_eq!(score.total, 10);
        assert_eq!(score.points_in("r2"), Some(&RoundPoints::Absent));
        assert_eq!(
            score.points_in("r3"),
            Some(&RoundPoints::Unplaced { status: Status::Dnf })
        );
        assert_eq!(score.rounds_competed(), 2);
    }

    #[test]
    fn test_placement_beyond_table_gets_floor() {
        let rounds = Round::sequence(&["r1"]);
        let mut by_round = BTreeMap::new();
        by_round.insert("r1".to_string(), vec![result("A", &rounds[0], placed(250))]);

        let category = Category::individual("U13B");
        let score = aggregate(&athlete("A"), &category, &rounds, &by_round, &policy(None));
        assert_eq!(score.total, 1);
    }

    #[test]
    fn test_earlier_round_contribution_stable_when_rounds_added() {
        let all = Round::sequence(&["r1", "r2"]);
        let mut by_round = BTreeMap::new();
        by_round.insert("r1".to_string(), vec![result("A", &all[0], placed(2))]);
        by_round.insert("r2".to_string(), vec![result("A", &all[1], placed(1))]);

        let category = Category::individual("U13B");
        let first = aggregate(&athlete("A"), &category, &all[..1], &by_round, &policy(None));
        let both = aggregate(&athlete("A"), &category, &all, &by_round, &policy(None));

        assert_eq!(first.total, 8);
        assert_eq!(both.points_in("r1"), first.points_in("r1"));
        assert_eq!(both.total, 18);
    }

    #[test]
    fn test_counted_total_uses_best_rounds() {
        let rounds = Round::sequence(&["r1", "r2", "r3"]);
        let mut by_round = BTreeMap::new();
        by_round.insert("r1".to_string(), vec![result("A", &rounds[0], placed(5))]);
        by_round.insert("r2".to_string(), vec![result("A", &rounds[1], placed(1))]);
        by_round.insert("r3".to_string(), vec![result("A", &rounds[2], placed(2))]);

        let category = Category::individual("U13B");
        let score = aggregate(&athlete("A"), &category, &rounds, &by_round, &policy(Some(2)));
        assert_eq!(score.total, 22);
        assert_eq!(score.counted_total, 18);
    }

    #[test]
    fn test_aggregate_is_reproducible() {
        let rounds = Round::sequence(&["r1", "r2"]);
        let mut by_round = BTreeMap::new();
        by_round.insert("r1".to_string(), vec![result("A", &rounds[0], placed(3))]);

        let category = Category::individual("U13B");
        let a = aggregate(&athlete("A"), &category, &rounds, &by_round, &policy(None));
        let b = aggregate(&athlete("A"), &category, &rounds, &by_round, &policy(None));
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }
}
