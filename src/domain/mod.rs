pub mod athlete;
pub mod category;
pub mod result;
pub mod round;
pub mod score;
pub mod team;

pub use athlete::{Athlete, Gender};
pub use category::{Category, TeamRule, TeamScope};
pub use result::{Outcome, RaceResult, Status};
pub use round::Round;
pub use score::{RoundEntry, RoundPoints, Score};
pub use team::{CountedMember, Team, TeamRoundEntry, TeamRoundPoints, TeamRoundScore, TeamScore};
