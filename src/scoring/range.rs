use anyhow::{bail, Result};

/// Placement range expression used by the points table and the guest list.
/// Accepted forms: `<N`, `<=N`, `>N`, `>=N`, `N`, `N-M` (inclusive).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeOp {
    LessThan(u32),
    LessEqual(u32),
    GreaterThan(u32),
    GreaterEqual(u32),
    Equal(u32),
    Between(u32, u32), // Inclusive range: N-M
}

impl RangeOp {
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(val) = s.strip_prefix(">=") {
            Ok(RangeOp::GreaterEqual(val.trim().parse()?))
        } else if let Some(val) = s.strip_prefix("<=") {
            Ok(RangeOp::LessEqual(val.trim().parse()?))
        } else if let Some(val) = s.strip_prefix('>') {
            Ok(RangeOp::GreaterThan(val.trim().parse()?))
        } else if let Some(val) = s.strip_prefix('<') {
            Ok(RangeOp::LessThan(val.trim().parse()?))
        } else if s.contains('-') && !s.starts_with('-') {
            let parts: Vec<&str> = s.split('-').collect();
            if parts.len() == 2 {
                let low: u32 = parts[0].trim().parse()?;
                let high: u32 = parts[1].trim().parse()?;
                if low > high {
                    bail!("Range start exceeds end: {}", s)
                }
                Ok(RangeOp::Between(low, high))
            } else {
                bail!("Invalid range format: {}", s)
            }
        } else {
            Ok(RangeOp::Equal(s.parse()?))
        }
    }

    pub fn matches(&self, value: u32) -> bool {
        match self {
            RangeOp::LessThan(n) => value < *n,
            RangeOp::LessEqual(n) => value <= *n,
            RangeOp::GreaterThan(n) => value > *n,
            RangeOp::GreaterEqual(n) => value >= *n,
            RangeOp::Equal(n) => value == *n,
            RangeOp::Between(low, high) => value >= *low && value <= *high,
        }
    }

    /// Values where membership flips: the first value inside the range and
    /// the first value past it, where those exist.
    pub fn edges(&self) -> Vec<u32> {
        match self {
            RangeOp::LessThan(n) | RangeOp::GreaterEqual(n) => vec![*n],
            RangeOp::LessEqual(n) | RangeOp::GreaterThan(n) => vec![n.saturating_add(1)],
            RangeOp::Equal(n) => vec![*n, n.saturating_add(1)],
            RangeOp::Between(low, high) => vec![*low, high.saturating_add(1)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range_less_than() {
        let range = RangeOp::parse("<4").unwrap();
        assert!(range.matches(3));
        assert!(!range.matches(4));
        assert_eq!(range.edges(), vec![4]);
    }

    #[test]
    fn test_parse_range_greater_equal() {
        let range = RangeOp::parse(">=20").unwrap();
        assert!(!range.matches(19));
        assert!(range.matches(20));
        assert!(range.matches(500));
    }

    #[test]
    fn test_parse_range_equal() {
        let range = RangeOp::parse(" 1 ").unwrap();
        assert!(range.matches(1));
        assert!(!range.matches(2));
    }

    #[test]
    fn test_parse_range_between() {
        let range = RangeOp::parse("6-10").unwrap();
        assert!(!range.matches(5));
        assert!(range.matches(6));
        assert!(range.matches(10));
        assert!(!range.matches(11));
        assert_eq!(range.edges(), vec![6, 11]);
    }

    #[test]
    fn test_parse_range_rejects_garbage() {
        assert!(RangeOp::parse("first").is_err());
        assert!(RangeOp::parse("10-6").is_err());
        assert!(RangeOp::parse("1-2-3").is_err());
        assert!(RangeOp::parse("-3").is_err());
    }
}
