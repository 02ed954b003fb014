//! Human time strings ("4m21s", "90s", "12.5") to second offsets.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, SocratesError};

static PAIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([\d.,]+)([A-Za-z]?)").expect("duration pattern is valid"));

/// Parse a sequence of `(number)(unit)` pairs into seconds.
///
/// Units are `m` (minutes) and `s` (seconds). The final pair may omit its
/// unit, in which case it counts as seconds. Commas are accepted as decimal
/// separators.
pub fn parse_duration(input: &str) -> Result<f64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(SocratesError::invalid_duration(input, "empty"));
    }

    let mut rest = trimmed;
    let mut total = 0.0;

    while !rest.is_empty() {
        let caps = PAIR
            .captures(rest)
            .ok_or_else(|| SocratesError::invalid_duration(input, format!("unexpected {rest:?}")))?;

        let literal = &caps[1];
        let unit = &caps[2];
        let value: f64 = literal
            .replace(',', ".")
            .parse()
            .map_err(|_| SocratesError::invalid_duration(input, format!("bad number {literal:?}")))?;

        let consumed = caps[0].len();
        let multiplier = match unit {
            "m" => 60.0,
            "s" => 1.0,
            "" if consumed == rest.len() => 1.0,
            "" => {
                return Err(SocratesError::invalid_duration(input, "missing unit"));
            }
            other => {
                return Err(SocratesError::invalid_duration(
                    input,
                    format!("unknown unit {other:?}"),
                ));
            }
        };

        total += value * multiplier;
        rest = &rest[consumed..];
    }

    Ok(total)
}

/// Render seconds back into the fragment form accepted by [`parse_duration`],
/// to a tenth of a second.
pub fn format_duration_fragment(seconds: f64) -> String {
    let tenths = (seconds.max(0.0) * 10.0).round() as u64;
    let mins = tenths / 600;
    let secs = (tenths % 600) / 10;
    let secs = match tenths % 10 {
        0 => format!("{secs}s"),
        fraction => format!("{secs}.{fraction}s"),
    };
    if mins == 0 {
        secs
    } else {
        format!("{mins}m{secs}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minutes_and_seconds() {
        assert_eq!(parse_duration("4m21s").unwrap(), 261.0);
        assert_eq!(parse_duration("90s").unwrap(), 90.0);
        assert_eq!(parse_duration("2m").unwrap(), 120.0);
    }

    #[test]
    fn bare_number_is_seconds() {
        assert_eq!(parse_duration("42").unwrap(), 42.0);
        assert_eq!(parse_duration("1m30").unwrap(), 90.0);
        assert_eq!(parse_duration("12.5").unwrap(), 12.5);
        assert_eq!(parse_duration("1,5m").unwrap(), 90.0);
    }

    #[test]
    fn rejects_empty_and_unknown_units() {
        assert!(matches!(
            parse_duration(""),
            Err(SocratesError::InvalidDuration { .. })
        ));
        assert!(matches!(
            parse_duration("   "),
            Err(SocratesError::InvalidDuration { .. })
        ));
        assert!(matches!(
            parse_duration("3h"),
            Err(SocratesError::InvalidDuration { .. })
        ));
        assert!(matches!(
            parse_duration("m3s"),
            Err(SocratesError::InvalidDuration { .. })
        ));
        assert!(matches!(
            parse_duration("1..2s"),
            Err(SocratesError::InvalidDuration { .. })
        ));
    }

    #[test]
    fn fragment_form_parses_back() {
        assert_eq!(format_duration_fragment(261.0), "4m21s");
        assert_eq!(format_duration_fragment(9.0), "9s");
        assert_eq!(format_duration_fragment(12.5), "12.5s");
        assert_eq!(format_duration_fragment(61.04), "1m1s");
        assert_eq!(parse_duration(&format_duration_fragment(12.5)).unwrap(), 12.5);
        assert_eq!(parse_duration(&format_duration_fragment(90.5)).unwrap(), 90.5);
        assert_eq!(parse_duration(&format_duration_fragment(272.0)).unwrap(), 272.0);
    }
}
