pub mod parse;
pub mod race;

pub use race::{process, RawRow, RawUnit};
