//! Category rules: label canonicalization, eligibility and team sizing.
//!
//! Built once from a validated [`LeagueConfig`] and shared read-only by every
//! processing and scoring task of a run.

mod guests;

pub use guests::GuestList;

use anyhow::{bail, Result};
use std::collections::HashMap;

use crate::config::{DivisionSet, LeagueConfig};
use crate::domain::athlete::normalize_text;
use crate::domain::{Athlete, Category, Gender};
use crate::error::StandingsError;

#[derive(Debug, Clone)]
pub struct CategoryRules {
    categories: Vec<Category>,
    /// Normalized label to the (gender, category index) pairs that claim it
    labels: HashMap<String, Vec<(Option<Gender>, usize)>>,
    guests: GuestList,
    division_sets: HashMap<String, DivisionSet>,
}

pub(crate) fn label_key(label: &str) -> String {
    normalize_text(label).to_ascii_lowercase()
}

impl CategoryRules {
    pub fn from_config(config: &LeagueConfig) -> Result<Self> {
        let mut labels: HashMap<String, Vec<(Option<Gender>, usize)>> = HashMap::new();
        for (index, category) in config.categories.iter().enumerate() {
            let variants = std::iter::once(&category.code).chain(category.labels.iter());
            for label in variants {
                let claims = labels.entry(label_key(label)).or_default();
                if let Some(&(_, existing)) = claims
                    .iter()
                    .find(|(gender, i)| *gender == category.gender && *i != index)
                {
                    bail!(
                        "label '{}' maps to both {} and {}",
                        label,
                        config.categories[existing].code,
                        category.code
                    );
                }
                if !claims.contains(&(category.gender, index)) {
                    claims.push((category.gender, index));
                }
            }
        }

        Ok(Self {
            categories: config.categories.clone(),
            labels,
            guests: GuestList::parse(&config.guests)?,
            division_sets: config
                .division_sets
                .iter()
                .map(|(name, set)| (name.clone(), set.clone()))
                .collect(),
        })
    }

    /// Map a raw result-file label to its canonical category.
    ///
    /// The same label may name one category per gender ("V40" is MV40 for
    /// men and WV40 for women). Lookup tries the row's gender, then the
    /// race's gender, then a gender-less claim, then a single claim from the
    /// unit's race, then a single claim overall. Anything still ambiguous is
    /// unknown.
    pub fn canonicalize(
        &self,
        raw_label: &str,
        gender: Option<Gender>,
        race: &str,
    ) -> Result<&Category, StandingsError> {
        let claims = self
            .labels
            .get(&label_key(raw_label))
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        let claimed_by = |wanted: Option<Gender>| {
            claims
                .iter()
                .find(|(g, _)| *g == wanted)
                .map(|&(_, index)| index)
        };
        let only = |mut candidates: Vec<usize>| match candidates.len() {
            1 => candidates.pop(),
            _ => None,
        };

        let race_key = label_key(race);
        let index = gender
            .and_then(|g| claimed_by(Some(g)))
            .or_else(|| self.race_gender(race).and_then(|g| claimed_by(Some(g))))
            .or_else(|| claimed_by(None))
            .or_else(|| {
                only(
                    claims
                        .iter()
                        .map(|&(_, i)| i)
                        .filter(|&i| label_key(self.categories[i].race_name()) == race_key)
                        .collect(),
                )
            })
            .or_else(|| only(claims.iter().map(|&(_, i)| i).collect()));

        index
            .map(|i| &self.categories[i])
            .ok_or_else(|| StandingsError::UnknownCategory {
                label: raw_label.to_string(),
            })
    }

    /// Gender shared by every category read from a race, if they agree.
    pub fn race_gender(&self, race: &str) -> Option<Gender> {
        let mut genders = self.categories_for_race(race).map(|c| c.gender);
        let first = genders.next()??;
        genders.all(|g| g == Some(first)).then_some(first)
    }

    pub fn category(&self, code: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.code == code)
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Categories whose results are read from the given race file. Race
    /// names match the way labels do, ignoring case and spacing.
    pub fn categories_for_race<'a>(&'a self, race: &str) -> impl Iterator<Item = &'a Category> {
        let key = label_key(race);
        self.categories
            .iter()
            .filter(move |c| label_key(c.race_name()) == key)
    }

    /// Whether two categories are read from the same race file.
    pub fn same_race(&self, a: &Category, b: &Category) -> bool {
        label_key(a.race_name()) == label_key(b.race_name())
    }

    pub fn is_guest(&self, athlete_id: &str) -> bool {
        self.guests.contains(athlete_id)
    }

    pub fn is_scoring_eligible(&self, athlete: &Athlete) -> bool {
        !athlete.guest
    }

    /// Whether the athlete's result may count for a team in this category.
    pub fn is_team_eligible(&self, athlete: &Athlete, category: &Category) -> bool {
        category.is_team_category() && self.is_scoring_eligible(athlete) && athlete.has_club()
    }

    /// Whether the athlete is listed in the category's individual standings.
    pub fn in_individual_standings(&self, athlete: &Athlete, category: &Category) -> bool {
        self.is_scoring_eligible(athlete) || category.guests_in_standings
    }

    pub fn scoring_subset_size(&self, category: &Category) -> Option<usize> {
        category.team.as_ref().map(|t| t.scoring_size)
    }

    pub fn min_team_size(&self, category: &Category) -> Option<usize> {
        category.team.as_ref().and_then(|t| t.min_members)
    }

    pub fn uses_squads(&self, category: &Category) -> bool {
        category.team.as_ref().is_some_and(|t| t.squads)
    }

    /// Division a team competes in, looked up by team name ("Club A") and
    /// then by bare club name.
    pub fn division_for(&self, category: &Category, team_name: &str, club: &str) -> Option<String> {
        let set = self.division_sets.get(category.division_set.as_deref()?)?;
        set.teams
            .get(team_name)
            .or_else(|| set.teams.get(club))
            .or(set.default.as_ref())
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TeamRule;

    fn athlete(id: &str, club: &str, guest: bool) -> Athlete {
        Athlete {
            id: id.to_string(),
            name: format!("Runner {}", id),
            gender: None,
            club: club.to_string(),
            guest,
        }
    }

    fn rules() -> CategoryRules {
        CategoryRules::from_config(&LeagueConfig::default()).unwrap()
    }

    #[test]
    fn test_canonicalize_known_labels() {
        let rules = rules();
        assert_eq!(rules.canonicalize("U13 Boys", None, "U13").unwrap().code, "U13B");
        assert_eq!(rules.canonicalize("  u13   boys ", None, "U13").unwrap().code, "U13B");
        assert_eq!(rules.canonicalize("U13B", None, "U13").unwrap().code, "U13B");
    }

    #[test]
    fn test_default_senior_labels_match_race_files() {
        let rules = rules();
        assert_eq!(rules.canonicalize("Men", None, "Men").unwrap().code, "SM");
        assert_eq!(rules.canonicalize("women", None, "Women").unwrap().code, "SW");
    }

    #[test]
    fn test_canonicalize_unknown_label_is_error() {
        let err = rules().canonicalize("U12 Boys", None, "U12").unwrap_err();
        assert_eq!(
            err,
            StandingsError::UnknownCategory {
                label: "U12 Boys".to_string()
            }
        );
    }

    fn veterans() -> LeagueConfig {
        let vet = |code: &str, race: &str, gender: Gender| Category {
            labels: vec!["V40".to_string()],
            race: Some(race.to_string()),
            gender: Some(gender),
            ..Category::individual(code)
        };
        LeagueConfig {
            categories: vec![
                vet("MV40", "Men", Gender::Male),
                vet("WV40", "Women", Gender::Female),
            ],
            ..LeagueConfig::default()
        }
    }

    #[test]
    fn test_same_label_split_by_gender() {
        let rules = CategoryRules::from_config(&veterans()).unwrap();
        let code = |gender, race| rules.canonicalize("V40", gender, race).unwrap().code.clone();

        assert_eq!(code(Some(Gender::Male), "Men"), "MV40");
        assert_eq!(code(Some(Gender::Female), "Men"), "WV40");
        // no gender column: the race decides
        assert_eq!(code(None, "Men"), "MV40");
        assert_eq!(code(None, "women"), "WV40");
    }

    #[test]
    fn test_gendered_label_ambiguous_without_hints() {
        let rules = CategoryRules::from_config(&veterans()).unwrap();
        let err = rules.canonicalize("V40", None, "Mixed").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::UnknownCategory);
    }

    #[test]
    fn test_same_label_same_gender_still_conflicts() {
        let mut config = veterans();
        config.categories[1].gender = Some(Gender::Male);
        assert!(CategoryRules::from_config(&config).is_err());
    }

    #[test]
    fn test_race_names_match_loosely() {
        let rules = rules();
        assert_eq!(rules.categories_for_race("men").count(), 1);
        assert_eq!(rules.categories_for_race(" U13 ").count(), 2);
        assert_eq!(rules.race_gender("Men"), Some(Gender::Male));
        assert_eq!(rules.race_gender("U13"), None);
    }

    #[test]
    fn test_label_conflict_rejected() {
        let mut config = LeagueConfig::default();
        config.categories[2].labels.push("U13 Boys".to_string());
        assert!(CategoryRules::from_config(&config).is_err());
    }

    #[test]
    fn test_team_eligibility() {
        let rules = rules();
        let u13b = rules.category("U13B").unwrap().clone();
        let sm = rules.category("SM").unwrap().clone();

        assert!(rules.is_team_eligible(&athlete("1", "Oxford City AC", false), &u13b));
        assert!(!rules.is_team_eligible(&athlete("2", "Oxford City AC", true), &u13b));
        assert!(!rules.is_team_eligible(&athlete("3", "", false), &u13b));
        assert!(!rules.is_team_eligible(&athlete("4", "Oxford City AC", false), &sm));
    }

    #[test]
    fn test_guest_ranges_from_config() {
        let rules = rules();
        assert!(rules.is_guest("956"));
        assert!(rules.is_guest("1720"));
        assert!(!rules.is_guest("1764"));
    }

    #[test]
    fn test_subset_and_min_sizes() {
        let rules = rules();
        let u13b = rules.category("U13B").unwrap();
        assert_eq!(rules.scoring_subset_size(u13b), Some(3));
        assert_eq!(rules.min_team_size(u13b), Some(2));
        assert!(rules.uses_squads(u13b));
        assert_eq!(rules.scoring_subset_size(rules.category("SM").unwrap()), None);
    }

    #[test]
    fn test_division_lookup() {
        let rules = rules();
        let u13b = rules.category("U13B").unwrap();
        assert_eq!(
            rules.division_for(u13b, "Oxford City AC A", "Oxford City AC").as_deref(),
            Some("1")
        );
        assert_eq!(
            rules.division_for(u13b, "Oxford City AC B", "Oxford City AC").as_deref(),
            Some("2")
        );
        let plain = Category {
            team: Some(TeamRule {
                scoring_size: 3,
                min_members: None,
                squads: false,
                scope: Default::default(),
            }),
            ..Category::individual("X")
        };
        assert_eq!(rules.division_for(&plain, "Club", "Club"), None);
    }

    #[test]
    fn test_categories_for_race() {
        let rules = rules();
        let codes: Vec<&str> = rules.categories_for_race("U13").map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["U13B", "U13G"]);
    }
}
