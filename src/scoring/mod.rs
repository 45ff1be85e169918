pub mod config;
pub mod individual;
pub mod points;
pub mod range;
pub mod standings;
pub mod team;
pub mod validation;

pub use config::*;
pub use individual::aggregate;
pub use points::PointsTable;
pub use range::RangeOp;
pub use standings::{rank_scores, rank_teams, Ranked};
pub use team::{aggregate_team, derive_teams, score_team};
pub use validation::validate_league;

use anyhow::Result;

use crate::config::LeagueConfig;

/// Points conversion plus the best-N counting rule, shared by the
/// individual and team aggregators.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringPolicy {
    pub points: PointsTable,
    pub counted_rounds: Option<usize>,
}

impl ScoringPolicy {
    pub fn from_config(config: &LeagueConfig) -> Result<Self> {
        Ok(Self {
            points: PointsTable::from_config(&config.points)?,
            counted_rounds: config.counted_rounds,
        })
    }

    /// Sum of the best `counted_rounds` values, or of all of them when the
    /// league counts every round.
    pub fn counted_total(&self, round_points: &[u32]) -> u32 {
        match self.counted_rounds {
            Some(n) => {
                let mut sorted = round_points.to_vec();
                sorted.sort_unstable_by(|a, b| b.cmp(a));
                sorted.into_iter().take(n).sum()
            }
            None => round_points.iter().sum(),
        }
    }
}
