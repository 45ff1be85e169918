use serde::Serialize;

/// A club's team within a category: a view derived from race results,
/// never stored on its own.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Team {
    pub club: String,
    /// Squad letter (A, B, ...) when the category splits clubs into squads
    pub squad: Option<char>,
}

impl Team {
    pub fn club(club: impl Into<String>) -> Self {
        Self {
            club: club.into(),
            squad: None,
        }
    }

    pub fn squad(club: impl Into<String>, index: usize) -> Option<Self> {
        let letter = u8::try_from(index).ok().filter(|i| *i < 26)?;
        Some(Self {
            club: club.into(),
            squad: Some(char::from(b'A' + letter)),
        })
    }

    /// Zero-based squad index (A = 0)
    pub fn squad_index(&self) -> Option<usize> {
        self.squad.map(|c| (c as u8 - b'A') as usize)
    }

    pub fn name(&self) -> String {
        match self.squad {
            Some(letter) => format!("{} {}", self.club, letter),
            None => self.club.clone(),
        }
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A finisher whose points counted toward a team's round score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountedMember {
    pub athlete_id: String,
    pub name: String,
    pub placement: u32,
    pub points: u32,
}

/// A team's result for one round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamRoundScore {
    pub team: Team,
    pub category: String,
    pub round: String,
    pub members: Vec<CountedMember>,
    pub points: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TeamRoundPoints {
    Absent,
    Scored { points: u32 },
    /// The team ran but fell short of the category's minimum
    Insufficient { finishers: usize, required: usize },
}

impl TeamRoundPoints {
    pub fn points(&self) -> u32 {
        match self {
            TeamRoundPoints::Scored { points } => *points,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamRoundEntry {
    pub round: String,
    #[serde(flatten)]
    pub outcome: TeamRoundPoints,
}

/// A team's cumulative standing in one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamScore {
    pub team: Team,
    pub name: String,
    pub category: String,
    pub division: Option<String>,
    pub rounds: Vec<TeamRoundEntry>,
    pub total: u32,
    pub counted_total: u32,
}

impl TeamScore {
    pub fn best_round(&self) -> u32 {
        self.rounds
            .iter()
            .map(|r| r.outcome.points())
            .max()
            .unwrap_or(0)
    }
}
