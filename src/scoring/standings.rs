use serde::Serialize;
use std::cmp::{Ordering, Reverse};

use crate::domain::{Score, TeamScore};

/// A standings row with its league position. Entries with identical
/// scoring keys share a position ("1, 2, 2, 4").
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ranked<T> {
    pub position: u32,
    #[serde(flatten)]
    pub entry: T,
}

type RankKey = (Reverse<u32>, Reverse<u32>, Reverse<u32>);

fn score_key(score: &Score) -> RankKey {
    (
        Reverse(score.counted_total),
        Reverse(score.total),
        Reverse(score.best_round()),
    )
}

fn team_key(team: &TeamScore) -> RankKey {
    (
        Reverse(team.counted_total),
        Reverse(team.total),
        Reverse(team.best_round()),
    )
}

fn assign_positions<T>(sorted: Vec<T>, key: impl Fn(&T) -> RankKey) -> Vec<Ranked<T>> {
    let mut ranked: Vec<Ranked<T>> = Vec::with_capacity(sorted.len());
    for (i, entry) in sorted.into_iter().enumerate() {
        let position = match ranked.last() {
            Some(prev) if key(&prev.entry) == key(&entry) => prev.position,
            _ => i as u32 + 1,
        };
        ranked.push(Ranked { position, entry });
    }
    ranked
}

/// Order individual scores: counted total, then total, then best single
/// round (all descending). Remaining ties fall back to name and race number
/// so the order never depends on input order.
pub fn rank_scores(mut scores: Vec<Score>) -> Vec<Ranked<Score>> {
    scores.sort_by(|a, b| {
        score_key(a)
            .cmp(&score_key(b))
            .then_with(|| a.athlete.name.cmp(&b.athlete.name))
            .then_with(|| a.athlete.id.cmp(&b.athlete.id))
    });
    assign_positions(scores, score_key)
}

/// Order team scores within each division (teams without a division come
/// first), using the same keys as individuals and the team name last.
pub fn rank_teams(mut teams: Vec<TeamScore>) -> Vec<Ranked<TeamScore>> {
    let by_score = |a: &TeamScore, b: &TeamScore| -> Ordering {
        team_key(a)
            .cmp(&team_key(b))
            .then_with(|| a.name.cmp(&b.name))
    };
    teams.sort_by(|a, b| a.division.cmp(&b.division).then_with(|| by_score(a, b)));

    let mut ranked = Vec::with_capacity(teams.len());
    let mut start = 0;
    while start < teams.len() {
        let division = teams[start].division.clone();
        let end = teams[start..]
            .iter()
            .position(|t| t.division != division)
            .map(|offset| start + offset)
            .unwrap_or(teams.len());
        ranked.extend(assign_positions(teams[start..end].to_vec(), team_key));
        start = end;
    }
    ranked
}
