use anyhow::{Context, Result};

use super::config::PointsConfig;
use super::range::RangeOp;

/// Compiled placement to points table.
#[derive(Debug, Clone, PartialEq)]
pub struct PointsTable {
    buckets: Vec<(RangeOp, u32)>,
    floor: u32,
}

impl PointsTable {
    pub fn from_config(config: &PointsConfig) -> Result<Self> {
        let buckets = config
            .table
            .iter()
            .enumerate()
            .map(|(i, bucket)| {
                RangeOp::parse(&bucket.range)
                    .with_context(|| format!("points.table[{}]: invalid range '{}'", i, bucket.range))
                    .map(|range| (range, bucket.points))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            buckets,
            floor: config.floor.unwrap_or(0),
        })
    }

    /// Points for a placement. First matching bucket wins; anything the
    /// table does not cover earns the floor.
    pub fn points_for(&self, placement: u32) -> u32 {
        self.buckets
            .iter()
            .find(|(range, _)| range.matches(placement))
            .map(|(_, points)| *points)
            .unwrap_or(self.floor)
    }

    pub fn floor(&self) -> u32 {
        self.floor
    }

    /// First placement whose points exceed the previous placement's, if any.
    ///
    /// Points only change where some bucket starts or ends, so only those
    /// placements are checked.
    pub fn first_increase(&self) -> Option<u32> {
        let mut edges: Vec<u32> = self
            .buckets
            .iter()
            .flat_map(|(range, _)| range.edges())
            .filter(|&p| p >= 2)
            .collect();
        edges.sort_unstable();
        edges.dedup();

        edges
            .into_iter()
            .find(|&p| self.points_for(p) > self.points_for(p - 1))
    }
}
