//! Duration literal grammar (spec §3, §6): `(NUM 'h')? (NUM 'm')? (NUM 's')?`
//! with at least one component present and the total strictly greater than
//! zero.

use std::time::Duration;

use regex::Regex;
use std::sync::OnceLock;

use crate::domain::errors::DomainError;

fn pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(?:(\d+)h)?(?:(\d+)m)?(?:(\d+)s)?$").expect("static regex"))
}

/// Parse a `completion.timeout`-style duration literal.
///
/// Rejects the empty string, strings with no recognized component, and
/// strings whose total duration is zero (e.g. `"0h0m0s"`).
pub fn parse_timeout(literal: &str) -> Result<Duration, DomainError> {
    let caps = pattern()
        .captures(literal)
        .filter(|c| c.iter().skip(1).any(|g| g.is_some()))
        .ok_or_else(|| DomainError::InvalidDuration(literal.to_string()))?;

    let component = |idx: usize| -> Result<u64, DomainError> {
        caps.get(idx)
            .map(|m| m.as_str().parse::<u64>())
            .transpose()
            .map_err(|_| DomainError::InvalidDuration(literal.to_string()))?
            .map_or(Ok(0), Ok)
    };

    let hours = component(1)?;
    let minutes = component(2)?;
    let seconds = component(3)?;

    let total_seconds = hours
        .checked_mul(3600)
        .and_then(|h| h.checked_add(minutes.checked_mul(60)?))
        .and_then(|hm| hm.checked_add(seconds))
        .ok_or_else(|| DomainError::InvalidDuration(literal.to_string()))?;

    if total_seconds == 0 {
        return Err(DomainError::InvalidDuration(literal.to_string()));
    }

    Ok(Duration::from_secs(total_seconds))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minutes_only() {
        assert_eq!(parse_timeout("30m").unwrap().as_millis(), 1_800_000);
    }

    #[test]
    fn parses_hours_and_minutes() {
        assert_eq!(parse_timeout("2h30m").unwrap().as_millis(), 9_000_000);
    }

    #[test]
    fn rejects_all_zero_components() {
        assert!(parse_timeout("0h0m0s").is_err());
    }

    #[test]
    fn rejects_empty_literal() {
        assert!(parse_timeout("").is_err());
    }

    #[test]
    fn rejects_malformed_literal() {
        assert!(parse_timeout("30x").is_err());
        assert!(parse_timeout("m30").is_err());
    }

    #[test]
    fn parses_seconds_only() {
        assert_eq!(parse_timeout("45s").unwrap().as_secs(), 45);
    }

    #[test]
    fn parses_all_three_components() {
        assert_eq!(parse_timeout("1h2m3s").unwrap().as_secs(), 3723);
    }
}
