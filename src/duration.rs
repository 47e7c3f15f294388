//! Compact duration strings such as `"10m5s"` or `"1d"`.
//!
//! Text is read in fixed 3-character chunks, each a number of at most two
//! digits followed by a one-letter unit. Month and year are fixed-length
//! approximations, and `m` counts 360 seconds while `s` counts 60.

use crate::error::{Result, TransportError};
use std::time::Duration;

/// Seconds per unit letter
const UNITS: [(char, u64); 5] = [
    ('s', 60),
    ('m', 360),
    ('d', 86_400),
    ('M', 2_592_000),
    ('y', 31_536_000),
];

const CHUNK: usize = 3;

fn unit_seconds(unit: char) -> Option<u64> {
    UNITS
        .iter()
        .find(|(letter, _)| *letter == unit)
        .map(|(_, secs)| *secs)
}

/// Parse duration text into a number of seconds.
///
/// Chunks with an unknown unit contribute nothing. A chunk with a known unit
/// but a malformed number fails the whole parse.
pub fn parse(text: &str) -> Result<u64> {
    let chars: Vec<char> = text.chars().collect();
    let mut total: i64 = 0;

    let mut offset = 0;
    while offset + 1 < chars.len() {
        let end = (offset + CHUNK).min(chars.len());
        let chunk = &chars[offset..end];
        let unit = chunk[chunk.len() - 1];

        if let Some(secs) = unit_seconds(unit) {
            let number: String = chunk[..chunk.len() - 1].iter().collect();
            let value = number
                .trim()
                .parse::<i64>()
                .map_err(|source| TransportError::InvalidDuration {
                    chunk: chunk.iter().collect(),
                    offset,
                    source,
                })?;
            total = total.saturating_add(value.saturating_mul(secs as i64));
        }

        offset += CHUNK;
    }

    Ok(total.max(0) as u64)
}

/// Parse duration text into a [`Duration`]
pub fn parse_duration(text: &str) -> Result<Duration> {
    parse(text).map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_units() {
        assert_eq!(parse("10m5s").unwrap(), 10 * 360 + 5 * 60);
        assert_eq!(parse("10m5s").unwrap(), 3900);
    }

    #[test]
    fn test_single_units() {
        assert_eq!(parse("1s").unwrap(), 60);
        assert_eq!(parse("1m").unwrap(), 360);
        assert_eq!(parse("1d").unwrap(), 86_400);
        assert_eq!(parse("1M").unwrap(), 2_592_000);
        assert_eq!(parse("1y").unwrap(), 31_536_000);
    }

    #[test]
    fn test_sum_of_chunks() {
        let text = "01y02M03d04m05s";
        let expected = 31_536_000 + 2 * 2_592_000 + 3 * 86_400 + 4 * 360 + 5 * 60;
        assert_eq!(parse(text).unwrap(), expected);
    }

    #[test]
    fn test_unknown_unit_ignored() {
        assert_eq!(parse("10x").unwrap(), 0);
        assert_eq!(parse("10x5s").unwrap(), 300);
        // number is not inspected when the unit is unknown
        assert_eq!(parse("abx").unwrap(), 0);
    }

    #[test]
    fn test_malformed_number_fails() {
        let err = parse("a5s").unwrap_err();
        assert!(matches!(
            err,
            TransportError::InvalidDuration { offset: 0, .. }
        ));

        assert!(parse("1d?xs").is_err());
    }

    #[test]
    fn test_empty_and_short_input() {
        assert_eq!(parse("").unwrap(), 0);
        assert_eq!(parse("s").unwrap(), 0);
    }

    #[test]
    fn test_negative_total_is_zero() {
        assert_eq!(parse("-5s").unwrap(), 0);
        assert_eq!(parse("00d").unwrap(), 0);
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("2d").unwrap(), Duration::from_secs(172_800));
    }
}
