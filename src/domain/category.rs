use serde::{Deserialize, Serialize};

use super::athlete::Gender;

/// A competition division with its own scoring rules.
///
/// Categories are declared in the league configuration and never change
/// during a run.
///
/// Example YAML:
/// ```yaml
/// code: U13B
/// name: Under 13 Boys
/// labels: ["U13 Boys", "U13B"]
/// race: U13
/// team: { scoring_size: 3, min_members: 2 }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Category {
    pub code: String,

    /// Display name (defaults to the code)
    #[serde(default)]
    pub name: Option<String>,

    /// Raw labels found in result files that map to this category.
    /// The code itself always maps too.
    #[serde(default)]
    pub labels: Vec<String>,

    /// Race file this category is read from (defaults to the code)
    #[serde(default)]
    pub race: Option<String>,

    #[serde(default)]
    pub gender: Option<Gender>,

    /// Team competition rule; absent for individual-only categories
    #[serde(default)]
    pub team: Option<TeamRule>,

    /// Name of the division set used to tier this category's teams
    #[serde(default)]
    pub division_set: Option<String>,

    /// Whether guests are listed in individual standings
    #[serde(default)]
    pub guests_in_standings: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TeamRule {
    /// How many of a team's top finishers count toward its round score
    pub scoring_size: usize,

    /// Teams with fewer finishers than this cannot score the round
    #[serde(default)]
    pub min_members: Option<usize>,

    /// Split each club into A, B, C... squads of `scoring_size`
    #[serde(default)]
    pub squads: bool,

    /// Where team members are drawn from
    #[serde(default)]
    pub scope: TeamScope,
}

/// `category` counts only this category's finishers. `race` counts every
/// finisher of the category's race, ordered by race-wide position, so
/// veterans also score for their club's senior team.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TeamScope {
    #[default]
    Category,
    Race,
}

impl Category {
    pub fn individual(code: &str) -> Self {
        Self {
            code: code.to_string(),
            name: None,
            labels: Vec::new(),
            race: None,
            gender: None,
            team: None,
            division_set: None,
            guests_in_standings: false,
        }
    }

    pub fn with_team(code: &str, scoring_size: usize) -> Self {
        Self {
            team: Some(TeamRule {
                scoring_size,
                min_members: None,
                squads: false,
                scope: TeamScope::Category,
            }),
            ..Self::individual(code)
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.code)
    }

    pub fn race_name(&self) -> &str {
        self.race.as_deref().unwrap_or(&self.code)
    }

    pub fn is_team_category(&self) -> bool {
        self.team.is_some()
    }

    pub fn team_scope(&self) -> TeamScope {
        self.team.as_ref().map(|t| t.scope).unwrap_or_default()
    }
}
