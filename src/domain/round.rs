use serde::Serialize;
use std::cmp::Ordering;

/// One discrete event of the league. Rounds order by their position in the
/// configured round list, never by their identifier text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Round {
    pub id: String,
    pub ordinal: usize,
}

impl Round {
    pub fn new(id: impl Into<String>, ordinal: usize) -> Self {
        Self {
            id: id.into(),
            ordinal,
        }
    }

    /// Build the ordered round sequence from configured identifiers.
    pub fn sequence<S: AsRef<str>>(ids: &[S]) -> Vec<Round> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| Round::new(id.as_ref(), i))
            .collect()
    }
}

impl Ord for Round {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ordinal
            .cmp(&other.ordinal)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for Round {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for Round {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}
