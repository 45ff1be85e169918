use serde::{Deserialize, Serialize};

/// Placement to points table.
///
/// Buckets are checked in order and the first match wins. Placements that
/// no bucket covers earn `floor`, so the table is total over every
/// placement a race can produce.
///
/// Example YAML:
/// ```yaml
/// points:
///   floor: 1
///   table:
///     - { range: "1", points: 10 }
///     - { range: "2", points: 8 }
///     - { range: "6-10", points: 2 }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PointsConfig {
    /// Points for placements beyond the table (default: 0)
    #[serde(default)]
    pub floor: Option<u32>,

    #[serde(default)]
    pub table: Vec<PointsBucket>,
}

impl Default for PointsConfig {
    fn default() -> Self {
        Self {
            floor: Some(1),
            table: vec![
                PointsBucket::new("1", 10),
                PointsBucket::new("2", 8),
                PointsBucket::new("3", 6),
                PointsBucket::new("4", 5),
                PointsBucket::new("5", 4),
            ],
        }
    }
}

/// Points bucket.
///
/// Range format: "<N", "<=N", ">N", ">=N", "N", "N-M" (inclusive range)
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PointsBucket {
    pub range: String,
    pub points: u32,
}

impl PointsBucket {
    pub fn new(range: &str, points: u32) -> Self {
        Self {
            range: range.to_string(),
            points,
        }
    }
}
