use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Parse a gender column value. Empty input means "not stated".
    pub fn parse(s: &str) -> Result<Option<Gender>, String> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" => Ok(None),
            "m" | "male" | "man" | "men" | "boy" | "boys" => Ok(Some(Gender::Male)),
            "f" | "w" | "female" | "woman" | "women" | "girl" | "girls" => {
                Ok(Some(Gender::Female))
            }
            other => Err(format!("unrecognised gender '{}'", other)),
        }
    }
}

/// A runner as first seen in the raw results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Athlete {
    /// Race number, unique within the competition
    pub id: String,
    pub name: String,
    pub gender: Option<Gender>,
    /// Club affiliation, empty for unattached runners
    pub club: String,
    /// Guests run but never score
    pub guest: bool,
}

impl Athlete {
    pub fn has_club(&self) -> bool {
        !self.club.is_empty()
    }
}

/// Trim and collapse runs of whitespace ("  Jo   Bloggs " -> "Jo Bloggs").
pub fn normalize_text(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
