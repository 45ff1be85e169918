use std::time::Duration;

use crate::domain::{Outcome, Status};

/// Parse a placement or status column: "7", tie-flagged "=7" or "7=",
/// "DNF", "DQ" or "DSQ".
pub fn parse_outcome(raw: &str) -> Result<Outcome, String> {
    let s = raw.trim();
    match s.to_ascii_uppercase().as_str() {
        "DNF" => return Ok(Outcome::Unplaced(Status::Dnf)),
        "DQ" | "DSQ" => return Ok(Outcome::Unplaced(Status::Dq)),
        "" => return Err("missing placement".to_string()),
        _ => {}
    }

    let (digits, tied) = if let Some(rest) = s.strip_prefix('=') {
        (rest, true)
    } else if let Some(rest) = s.strip_suffix('=') {
        (rest, true)
    } else {
        (s, false)
    };

    match digits.trim().parse::<u32>() {
        Ok(0) => Err("placement must be at least 1".to_string()),
        Ok(placement) => Ok(Outcome::Placed { placement, tied }),
        Err(_) => Err(format!("placement '{}' is not a number", s)),
    }
}

/// Parse a finishing time: "ss", "mm:ss" or "h:mm:ss", seconds optionally
/// fractional. Empty input means no time was recorded.
pub fn parse_time(raw: &str) -> Result<Option<Duration>, String> {
    let s = raw.trim();
    if s.is_empty() {
        return Ok(None);
    }

    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() > 3 {
        return Err(format!("time '{}' has too many fields", s));
    }

    let invalid = || format!("time '{}' is not h:mm:ss", s);
    let (whole, fraction) = parts[parts.len() - 1]
        .split_once('.')
        .map(|(w, f)| (w, Some(f)))
        .unwrap_or((parts[parts.len() - 1], None));

    let last = parts.len() - 1;
    let mut seconds: u64 = 0;
    for (i, field) in parts.iter().enumerate() {
        let digits = if i == last { whole } else { field };
        let value: u64 = digits.parse().map_err(|_| invalid())?;
        // only the leading field may exceed 59
        if i > 0 && value >= 60 {
            return Err(format!("time '{}' has a field above 59", s));
        }
        seconds = seconds
            .checked_mul(60)
            .and_then(|v| v.checked_add(value))
            .ok_or_else(invalid)?;
    }

    let nanos = match fraction {
        Some(f) if !f.is_empty() && f.len() <= 9 && f.chars().all(|c| c.is_ascii_digit()) => {
            let padded = format!("{:0<9}", f);
            padded.parse::<u32>().map_err(|_| invalid())?
        }
        Some(_) => return Err(invalid()),
        None => 0,
    };

    Ok(Some(Duration::new(seconds, nanos)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_outcome_placed() {
        assert_eq!(
            parse_outcome("7"),
            Ok(Outcome::Placed {
                placement: 7,
                tied: false
            })
        );
        assert_eq!(
            parse_outcome(" 12 "),
            Ok(Outcome::Placed {
                placement: 12,
                tied: false
            })
        );
    }

    #[test]
    fn test_parse_outcome_ties() {
        let tied = Outcome::Placed {
            placement: 3,
            tied: true,
        };
        assert_eq!(parse_outcome("=3"), Ok(tied));
        assert_eq!(parse_outcome("3="), Ok(tied));
    }

    #[test]
    fn test_parse_outcome_statuses() {
        assert_eq!(parse_outcome("dnf"), Ok(Outcome::Unplaced(Status::Dnf)));
        assert_eq!(parse_outcome("DQ"), Ok(Outcome::Unplaced(Status::Dq)));
        assert_eq!(parse_outcome("DSQ"), Ok(Outcome::Unplaced(Status::Dq)));
    }

    #[test]
    fn test_parse_outcome_rejects_garbage() {
        assert!(parse_outcome("").is_err());
        assert!(parse_outcome("0").is_err());
        assert!(parse_outcome("first").is_err());
        assert!(parse_outcome("-2").is_err());
        assert!(parse_outcome("==2").is_err());
    }

    #[test]
    fn test_parse_time_forms() {
        assert_eq!(parse_time(""), Ok(None));
        assert_eq!(parse_time("59"), Ok(Some(Duration::from_secs(59))));
        assert_eq!(parse_time("25:13"), Ok(Some(Duration::from_secs(25 * 60 + 13))));
        assert_eq!(
            parse_time("1:02:03"),
            Ok(Some(Duration::from_secs(3600 + 2 * 60 + 3)))
        );
        assert_eq!(
            parse_time("10:05.5"),
            Ok(Some(Duration::from_millis(605_500)))
        );
    }

    #[test]
    fn test_parse_time_rejects_garbage() {
        assert!(parse_time("ten minutes").is_err());
        assert!(parse_time("1:2:3:4").is_err());
        assert!(parse_time("10:xx").is_err());
        assert!(parse_time("10:05.").is_err());
    }

    #[test]
    fn test_parse_time_rejects_out_of_range_fields() {
        assert!(parse_time("1:99:99").is_err());
        assert!(parse_time("25:60").is_err());
        assert!(parse_time("1:60:00").is_err());
        assert_eq!(parse_time("90"), Ok(Some(Duration::from_secs(90))));
        assert_eq!(parse_time("75:00"), Ok(Some(Duration::from_secs(75 * 60))));
    }

    #[test]
    fn test_parse_time_overflow_is_error() {
        assert!(parse_time("18446744073709551615:00:00").is_err());
        assert!(parse_time("99999999999999999999").is_err());
    }
}
