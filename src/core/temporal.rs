//! Parsers for the temporal property types.
//!
//! Each converter treats text that does not parse as "no value" rather than
//! an error, so callers can fall back to their own defaults. Only a raw value
//! that is not text at all is reported as a failure.

use crate::domain::model::{ConvertedValue, Period, RawValue};
use crate::domain::ports::ConverterResult;
use crate::utils::error::CoercionError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use std::sync::LazyLock;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d"];
const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];
const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

static ISO_PERIOD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^([-+])?P(?:(-?\d+)Y)?(?:(-?\d+)M)?(?:(-?\d+)W)?(?:(-?\d+)D)?(?:T(?:(-?\d+)H)?(?:(-?\d+)M)?(?:(-?\d+)(?:[.,](\d{1,3}))?S)?)?$",
    )
    .expect("ISO period pattern is valid")
});

static COMPACT_PERIOD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:\d+\s*(?:ms|s|m|h|d|w)\s*)+$").expect("compact period pattern is valid")
});

static COMPACT_PART: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s*(ms|s|m|h|d|w)").expect("compact period part pattern is valid")
});

/// Extracts the text to parse. Empty text counts as no value.
fn text_input<'a>(raw: &'a RawValue, expected: &str) -> Result<Option<&'a str>, CoercionError> {
    match raw {
        RawValue::Null => Ok(None),
        RawValue::Text(s) => {
            let trimmed = s.trim();
            Ok((!trimmed.is_empty()).then_some(trimmed))
        }
        RawValue::Typed(value) => Err(CoercionError::UnsupportedSource {
            expected: expected.to_string(),
            found: value.kind(),
        }),
    }
}

pub fn convert_period(raw: &RawValue) -> ConverterResult {
    Ok(text_input(raw, "period")?
        .and_then(parse_period)
        .map(ConvertedValue::Period))
}

pub fn convert_date_time(raw: &RawValue) -> ConverterResult {
    Ok(text_input(raw, "date-time")?
        .and_then(parse_date_time)
        .map(ConvertedValue::DateTime))
}

pub fn convert_date(raw: &RawValue) -> ConverterResult {
    Ok(text_input(raw, "date")?
        .and_then(parse_date)
        .map(ConvertedValue::Date))
}

pub fn convert_time(raw: &RawValue) -> ConverterResult {
    Ok(text_input(raw, "time")?
        .and_then(parse_time)
        .map(ConvertedValue::Time))
}

/// Parses `PT1H`-style ISO-8601 periods or the compact `1h30m` form.
pub fn parse_period(s: &str) -> Option<Period> {
    let s = s.trim();
    parse_iso_period(s).or_else(|| parse_compact_period(s))
}

fn parse_iso_period(s: &str) -> Option<Period> {
    let caps = ISO_PERIOD.captures(s)?;
    // "P" and "PT" on their own carry no fields.
    if (2..=8).all(|i| caps.get(i).is_none()) {
        return None;
    }
    if s.to_ascii_uppercase().ends_with('T') {
        return None;
    }

    let field = |i: usize| -> Option<i32> {
        caps.get(i).map_or(Some(0), |m| m.as_str().parse::<i32>().ok())
    };
    let seconds = field(8)?;
    let millis = match caps.get(9) {
        Some(m) => {
            let digits = format!("{:0<3}", m.as_str());
            let ms = digits.parse::<i32>().ok()?;
            if caps.get(8).is_some_and(|m| m.as_str().starts_with('-')) {
                -ms
            } else {
                ms
            }
        }
        None => 0,
    };

    let mut period = Period {
        years: field(2)?,
        months: field(3)?,
        weeks: field(4)?,
        days: field(5)?,
        hours: field(6)?,
        minutes: field(7)?,
        seconds,
        millis,
    };
    if caps.get(1).is_some_and(|m| m.as_str() == "-") {
        period = negate(period)?;
    }
    Some(period)
}

fn parse_compact_period(s: &str) -> Option<Period> {
    if !COMPACT_PERIOD.is_match(s) {
        return None;
    }
    let mut period = Period::default();
    for caps in COMPACT_PART.captures_iter(s) {
        let amount = caps[1].parse::<i32>().ok()?;
        let unit = caps[2].to_ascii_lowercase();
        let slot = match unit.as_str() {
            "ms" => &mut period.millis,
            "s" => &mut period.seconds,
            "m" => &mut period.minutes,
            "h" => &mut period.hours,
            "d" => &mut period.days,
            "w" => &mut period.weeks,
            _ => return None,
        };
        *slot = slot.checked_add(amount)?;
    }
    Some(period)
}

fn negate(p: Period) -> Option<Period> {
    Some(Period {
        years: p.years.checked_neg()?,
        months: p.months.checked_neg()?,
        weeks: p.weeks.checked_neg()?,
        days: p.days.checked_neg()?,
        hours: p.hours.checked_neg()?,
        minutes: p.minutes.checked_neg()?,
        seconds: p.seconds.checked_neg()?,
        millis: p.millis.checked_neg()?,
    })
}

/// Parses a local timestamp. RFC 3339 input keeps its wall-clock time and
/// drops the offset.
pub fn parse_date_time(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_local()))
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

pub fn parse_time(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(s, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> RawValue {
        RawValue::from(s)
    }

    #[test]
    fn test_parse_iso_period() {
        assert_eq!(parse_period("PT1H"), Some(Period::hours(1)));
        assert_eq!(parse_period("P3D"), Some(Period::days(3)));
        assert_eq!(parse_period("pt15m"), Some(Period::minutes(15)));
        assert_eq!(parse_period("PT1.5S"), Some(Period { seconds: 1, millis: 500, ..Period::default() }));
        assert_eq!(
            parse_period("P1Y2M1W4DT5H6M7S"),
            Some(Period {
                years: 1,
                months: 2,
                weeks: 1,
                days: 4,
                hours: 5,
                minutes: 6,
                seconds: 7,
                millis: 0,
            })
        );
        assert_eq!(parse_period("-PT2H"), Some(Period::hours(-2)));
        assert_eq!(parse_period("PT-2H"), Some(Period::hours(-2)));
    }

    #[test]
    fn test_parse_compact_period() {
        assert_eq!(parse_period("3d"), Some(Period::days(3)));
        assert_eq!(parse_period("500ms"), Some(Period::millis(500)));
        assert_eq!(
            parse_period("1h 30m"),
            Some(Period { hours: 1, minutes: 30, ..Period::default() })
        );
        assert_eq!(parse_period("2w"), Some(Period { weeks: 2, ..Period::default() }));
        assert_eq!(parse_period("3D"), Some(Period::days(3)));
        assert_eq!(
            parse_period("1H 15M"),
            Some(Period { hours: 1, minutes: 15, ..Period::default() })
        );
        assert_eq!(parse_period("250MS"), Some(Period::millis(250)));
    }

    #[test]
    fn test_parse_period_rejects_malformed() {
        for input in ["not-a-duration", "P", "PT", "P1DT", "1x", "h1", "", "PT1H30", "99999999999h"] {
            assert_eq!(parse_period(input), None, "input {:?}", input);
        }
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15);
        assert_eq!(parse_date("2024-01-15"), expected);
        assert_eq!(parse_date("20240115"), expected);
        assert_eq!(parse_date(" 2024-01-15 "), expected);
        assert_eq!(parse_date("2024-02-30"), None);
        assert_eq!(parse_date("15/01/2024"), None);
    }

    #[test]
    fn test_parse_time_formats() {
        assert_eq!(parse_time("10:30"), NaiveTime::from_hms_opt(10, 30, 0));
        assert_eq!(parse_time("10:30:15"), NaiveTime::from_hms_opt(10, 30, 15));
        assert_eq!(
            parse_time("10:30:15.250"),
            NaiveTime::from_hms_milli_opt(10, 30, 15, 250)
        );
        assert_eq!(parse_time("25:00"), None);
        assert_eq!(parse_time("noon"), None);
    }

    #[test]
    fn test_parse_date_time_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15)
            .and_then(|d| d.and_hms_opt(10, 30, 0));
        assert_eq!(parse_date_time("2024-01-15T10:30:00"), expected);
        assert_eq!(parse_date_time("2024-01-15 10:30:00"), expected);
        assert_eq!(parse_date_time("2024-01-15T10:30"), expected);
        assert_eq!(parse_date_time("2024-01-15T10:30:00+02:00"), expected);
        assert_eq!(parse_date_time("2024-01-15T10:30:00Z"), expected);
        assert_eq!(parse_date_time("2024-01-15"), None);
    }

    #[test]
    fn test_converters_return_none_for_bad_text() {
        assert_eq!(convert_period(&text("soon")), Ok(None));
        assert_eq!(convert_date(&text("yesterday")), Ok(None));
        assert_eq!(convert_time(&text("later")), Ok(None));
        assert_eq!(convert_date_time(&text("now")), Ok(None));
        assert_eq!(convert_date(&RawValue::Null), Ok(None));
        assert_eq!(convert_date(&text("   ")), Ok(None));
    }

    #[test]
    fn test_converters_reject_typed_input() {
        let typed = RawValue::Typed(ConvertedValue::Integer(3));
        assert!(matches!(
            convert_period(&typed),
            Err(CoercionError::UnsupportedSource { found: "integer", .. })
        ));
    }
}
