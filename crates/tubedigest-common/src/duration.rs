//! Compact duration strings as returned by the video metadata provider.
//!
//! The accepted grammar is `PT` followed by up to three `<integer><unit>`
//! tokens in the order `H`, `M`, `S`, each optional. The live-broadcast
//! sentinel `P0D` and the empty string both mean zero, so live streams fall
//! below any minimum-length threshold instead of failing the lookup.

use std::time::Duration;

use crate::{Error, Result};

/// Duration reported for live or upcoming broadcasts.
pub const LIVE_SENTINEL: &str = "P0D";

const PREFIX: &str = "PT";

/// Parse a compact duration such as `PT1H2M3S` into elapsed time.
///
/// # Errors
///
/// Returns [`Error::Format`] if the input lacks the `PT` prefix, repeats or
/// reorders a unit, has a unit without digits, ends with dangling digits, or
/// contains any other character.
pub fn parse_duration(input: &str) -> Result<Duration> {
    if input.is_empty() || input == LIVE_SENTINEL {
        return Ok(Duration::ZERO);
    }

    let body = input
        .strip_prefix(PREFIX)
        .ok_or_else(|| Error::format(format!("duration must start with {PREFIX}: {input}")))?;

    let mut total: u64 = 0;
    let mut digits = String::new();
    // Rank of the last unit seen: H=1, M=2, S=3.
    let mut last_rank = 0u8;

    for ch in body.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }

        let (rank, factor) = match ch {
            'H' => (1, 3600),
            'M' => (2, 60),
            'S' => (3, 1),
            other => {
                return Err(Error::format(format!(
                    "unexpected character '{other}' in duration: {input}"
                )))
            }
        };

        if digits.is_empty() {
            return Err(Error::format(format!("unit '{ch}' without a value: {input}")));
        }
        if rank <= last_rank {
            return Err(Error::format(format!("unit '{ch}' out of order: {input}")));
        }

        let value: u64 = digits
            .parse()
            .map_err(|_| Error::format(format!("value too large in duration: {input}")))?;
        total = value
            .checked_mul(factor)
            .and_then(|secs| total.checked_add(secs))
            .ok_or_else(|| Error::format(format!("duration overflows: {input}")))?;

        digits.clear();
        last_rank = rank;
    }

    if !digits.is_empty() {
        return Err(Error::format(format!("trailing value without unit: {input}")));
    }

    Ok(Duration::from_secs(total))
}

/// Format elapsed time in the same compact grammar.
///
/// Zero components are omitted; zero itself is `PT0S`.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs == 0 {
        return "PT0S".to_string();
    }

    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    let mut out = String::from(PREFIX);
    if h > 0 {
        out.push_str(&format!("{h}H"));
    }
    if m > 0 {
        out.push_str(&format!("{m}M"));
    }
    if s > 0 {
        out.push_str(&format!("{s}S"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hms(h: u64, m: u64, s: u64) -> Duration {
        Duration::from_secs(h * 3600 + m * 60 + s)
    }

    #[test]
    fn parses_full_form() {
        assert_eq!(parse_duration("PT1H2M3S").unwrap(), hms(1, 2, 3));
    }

    #[test]
    fn parses_partial_forms() {
        assert_eq!(parse_duration("PT45M").unwrap(), hms(0, 45, 0));
        assert_eq!(parse_duration("PT10S").unwrap(), hms(0, 0, 10));
        assert_eq!(parse_duration("PT2H").unwrap(), hms(2, 0, 0));
        assert_eq!(parse_duration("PT1H30S").unwrap(), hms(1, 0, 30));
    }

    #[test]
    fn live_sentinel_and_empty_are_zero() {
        assert_eq!(parse_duration("P0D").unwrap(), Duration::ZERO);
        assert_eq!(parse_duration("").unwrap(), Duration::ZERO);
        assert_eq!(parse_duration("PT").unwrap(), Duration::ZERO);
    }

    #[test]
    fn missing_prefix_is_format_error() {
        assert!(matches!(parse_duration("45M"), Err(Error::Format(_))));
        assert!(matches!(parse_duration("P1DT2H"), Err(Error::Format(_))));
    }

    #[test]
    fn malformed_bodies_are_format_errors() {
        for bad in ["PTM", "PT5", "PT1M1H", "PT1H1H", "PT1.5M", "PT5X", "PT-3S"] {
            assert!(
                matches!(parse_duration(bad), Err(Error::Format(_))),
                "expected format error for {bad}"
            );
        }
    }

    #[test]
    fn overflow_is_format_error() {
        assert!(matches!(
            parse_duration("PT99999999999999999999H"),
            Err(Error::Format(_))
        ));
    }

    #[test]
    fn format_then_parse_preserves_components() {
        for h in [0, 1, 12, 100] {
            for m in [0, 1, 59] {
                for s in [0, 7, 59] {
                    let d = hms(h, m, s);
                    assert_eq!(parse_duration(&format_duration(d)).unwrap(), d);
                }
            }
        }
    }

    #[test]
    fn format_omits_zero_components() {
        assert_eq!(format_duration(hms(0, 40, 0)), "PT40M");
        assert_eq!(format_duration(hms(1, 0, 5)), "PT1H5S");
        assert_eq!(format_duration(Duration::ZERO), "PT0S");
    }
}
