use serde::Serialize;
use thiserror::Error;

/// Failures raised by the scoring core.
///
/// Every variant except `InsufficientTeamSize` aborts the whole
/// (round, race) unit it was raised in. `InsufficientTeamSize` only voids a
/// single team's score for a single round.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StandingsError {
    #[error("unknown category label '{label}'")]
    UnknownCategory { label: String },

    #[error("malformed row {line}: {reason}")]
    MalformedRow { line: usize, reason: String },

    #[error("duplicate placement {placement} in {category}: '{first}' and '{second}'")]
    DuplicatePlacement {
        category: String,
        placement: u32,
        first: String,
        second: String,
    },

    #[error("athlete {athlete} appears more than once in {category}")]
    DuplicateAthlete { athlete: String, category: String },

    #[error("team {team} in {category} has {finishers} finisher(s) in {round}, needs {required}")]
    InsufficientTeamSize {
        team: String,
        category: String,
        round: String,
        finishers: usize,
        required: usize,
    },

    #[error("input unreadable: {reason}")]
    Unreadable { reason: String },
}

/// Stable, machine-readable error kind for manifests and exit reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnknownCategory,
    MalformedRow,
    DuplicatePlacement,
    DuplicateAthlete,
    InsufficientTeamSize,
    Unreadable,
}

impl StandingsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StandingsError::UnknownCategory { .. } => ErrorKind::UnknownCategory,
            StandingsError::MalformedRow { .. } => ErrorKind::MalformedRow,
            StandingsError::DuplicatePlacement { .. } => ErrorKind::DuplicatePlacement,
            StandingsError::DuplicateAthlete { .. } => ErrorKind::DuplicateAthlete,
            StandingsError::InsufficientTeamSize { .. } => ErrorKind::InsufficientTeamSize,
            StandingsError::Unreadable { .. } => ErrorKind::Unreadable,
        }
    }

    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        StandingsError::MalformedRow {
            line,
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::UnknownCategory => "UnknownCategory",
            ErrorKind::MalformedRow => "MalformedRow",
            ErrorKind::DuplicatePlacement => "DuplicatePlacement",
            ErrorKind::DuplicateAthlete => "DuplicateAthlete",
            ErrorKind::InsufficientTeamSize => "InsufficientTeamSize",
            ErrorKind::Unreadable => "Unreadable",
        };
        write!(f, "{}", s)
    }
}
