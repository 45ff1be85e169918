use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::{Category, Gender, TeamRule};
use crate::scoring::PointsConfig;

/// League configuration, loaded once and shared read-only for a whole run.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LeagueConfig {
    /// Round identifiers in competition order
    pub rounds: Vec<String>,

    /// Count only the best N rounds toward `counted_total`
    #[serde(default)]
    pub counted_rounds: Option<usize>,

    #[serde(default)]
    pub points: PointsConfig,

    /// Guest race numbers: exact ids or numeric ranges such as "1718-1763"
    #[serde(default)]
    pub guests: Vec<String>,

    #[serde(default)]
    pub division_sets: BTreeMap<String, DivisionSet>,

    pub categories: Vec<Category>,
}

/// Maps team names (e.g. "Abingdon AC A") to a division.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DivisionSet {
    /// Division for teams not listed
    #[serde(default)]
    pub default: Option<String>,

    #[serde(default)]
    pub teams: BTreeMap<String, String>,
}

impl LeagueConfig {
    pub fn category(&self, code: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.code == code)
    }
}

impl Default for LeagueConfig {
    fn default() -> Self {
        let junior = |code: &str, name: &str, labels: &[&str], race: &str, gender: Gender| {
            Category {
                name: Some(name.to_string()),
                labels: labels.iter().map(|l| l.to_string()).collect(),
                race: Some(race.to_string()),
                gender: Some(gender),
                team: Some(TeamRule {
                    scoring_size: 3,
                    min_members: Some(2),
                    squads: true,
                    scope: Default::default(),
                }),
                ..Category::individual(code)
            }
        };

        let mut divisions = BTreeMap::new();
        divisions.insert(
            "juniors".to_string(),
            DivisionSet {
                default: Some("2".to_string()),
                teams: BTreeMap::from([("Oxford City AC A".to_string(), "1".to_string())]),
            },
        );

        let mut u13b = junior("U13B", "Under 13 Boys", &["U13 Boys"], "U13", Gender::Male);
        u13b.division_set = Some("juniors".to_string());
        let mut u13g = junior("U13G", "Under 13 Girls", &["U13 Girls"], "U13", Gender::Female);
        u13g.division_set = Some("juniors".to_string());

        Self {
            rounds: ["r1", "r2", "r3", "r4", "r5"]
                .iter()
                .map(|r| r.to_string())
                .collect(),
            counted_rounds: Some(4),
            points: PointsConfig::default(),
            guests: vec!["956".to_string(), "1718-1763".to_string()],
            division_sets: divisions,
            categories: vec![
                u13b,
                u13g,
                Category {
                    name: Some("Senior Men".to_string()),
                    labels: vec!["Senior Men".to_string(), "Men".to_string()],
                    race: Some("Men".to_string()),
                    gender: Some(Gender::Male),
                    ..Category::individual("SM")
                },
                Category {
                    name: Some("Senior Women".to_string()),
                    labels: vec!["Senior Women".to_string(), "Women".to_string()],
                    race: Some("Women".to_string()),
                    gender: Some(Gender::Female),
                    ..Category::individual("SW")
                },
            ],
        }
    }
}
