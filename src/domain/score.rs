use serde::Serialize;

use super::athlete::Athlete;
use super::result::Status;

/// What an entrant earned in one round.
///
/// `Absent` (did not start) is kept apart from an explicit zero so renderers
/// can leave the cell blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoundPoints {
    Absent,
    Scored { points: u32 },
    Unplaced { status: Status },
}

impl RoundPoints {
    pub fn points(&self) -> u32 {
        match self {
            RoundPoints::Scored { points } => *points,
            RoundPoints::Absent | RoundPoints::Unplaced { .. } => 0,
        }
    }

    pub fn participated(&self) -> bool {
        !matches!(self, RoundPoints::Absent)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundEntry {
    pub round: String,
    #[serde(flatten)]
    pub outcome: RoundPoints,
}

/// An athlete's cumulative standing in one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Score {
    pub athlete: Athlete,
    pub category: String,
    /// One entry per requested round, in round order
    pub rounds: Vec<RoundEntry>,
    pub total: u32,
    /// Sum of the best rounds when the league counts only N of them
    pub counted_total: u32,
}

impl Score {
    pub fn rounds_competed(&self) -> usize {
        self.rounds.iter().filter(|r| r.outcome.participated()).count()
    }

    pub fn best_round(&self) -> u32 {
        self.rounds
            .iter()
            .map(|r| r.outcome.points())
            .max()
            .unwrap_or(0)
    }

    pub fn points_in(&self, round: &str) -> Option<&RoundPoints> {
        self.rounds
            .iter()
            .find(|r| r.round == round)
            .map(|r| &r.outcome)
    }
}
