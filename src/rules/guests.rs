use anyhow::{Context, Result};
use std::collections::HashSet;

use crate::scoring::RangeOp;

/// Race numbers of entrants who run but never score.
#[derive(Debug, Clone, Default)]
pub struct GuestList {
    ids: HashSet<String>,
    ranges: Vec<RangeOp>,
}

impl GuestList {
    /// Entries are exact race numbers or numeric ranges ("1718-1763").
    pub fn parse(entries: &[String]) -> Result<Self> {
        let mut list = GuestList::default();
        for entry in entries {
            let entry = entry.trim();
            if entry.contains('-') {
                let range = RangeOp::parse(entry)
                    .with_context(|| format!("invalid guest range '{}'", entry))?;
                list.ranges.push(range);
            } else {
                list.ids.insert(entry.to_string());
            }
        }
        Ok(list)
    }

    pub fn contains(&self, id: &str) -> bool {
        let id = id.trim();
        if self.ids.contains(id) {
            return true;
        }
        match id.parse::<u32>() {
            Ok(number) => self.ranges.iter().any(|r| r.matches(number)),
            Err(_) => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty() && self.ranges.is_empty()
    }
}
