use serde::Serialize;
use std::time::Duration;

use super::athlete::Athlete;
use super::round::Round;

/// Why a starter has no placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Dnf,
    Dq,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Dnf => write!(f, "DNF"),
            Status::Dq => write!(f, "DQ"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Finished. `tied` is set when the source declared a shared placement.
    Placed { placement: u32, tied: bool },
    Unplaced(Status),
}

/// One athlete's result within one category of one round.
#[derive(Debug, Clone, PartialEq)]
pub struct RaceResult {
    pub athlete: Athlete,
    pub category: String,
    pub round: Round,
    pub outcome: Outcome,
    pub time: Option<Duration>,
    /// Position among every scoring finisher of the race, across categories
    pub race_rank: Option<u32>,
}

impl RaceResult {
    pub fn placement(&self) -> Option<u32> {
        match self.outcome {
            Outcome::Placed { placement, .. } => Some(placement),
            Outcome::Unplaced(_) => None,
        }
    }
}
