//! Lenient ISO 8601 timestamp parsing for query parameters.
//!
//! The store keeps naive wall-clock `DATETIME` values, so offsets in the
//! input are dropped rather than converted.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer};

use crate::error::{CoreError, CoreResult};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parses `input` as an RFC 3339 timestamp, a naive ISO datetime, or a bare
/// date (taken as midnight).
///
/// # Errors
///
/// [`CoreError::InvalidDateTime`] if none of the accepted shapes match.
pub fn parse_iso_datetime(input: &str) -> CoreResult<NaiveDateTime> {
    let s = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_local());
    }

    if let Some(dt) = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    {
        return Ok(dt);
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|d| d.and_time(NaiveTime::MIN))
        .map_err(|_| CoreError::InvalidDateTime(input.to_string()))
}

/// `serde(deserialize_with = ...)` adapter around [`parse_iso_datetime`].
pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_iso_datetime(&raw).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd_hms(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn parses_naive_datetime() {
        let dt = parse_iso_datetime("2024-01-15T08:30:00").unwrap();
        assert_eq!(dt, ymd_hms(2024, 1, 15, 8, 30, 0));
    }

    #[test]
    fn parses_space_separated_datetime() {
        let dt = parse_iso_datetime("2024-01-15 08:30:00").unwrap();
        assert_eq!(dt, ymd_hms(2024, 1, 15, 8, 30, 0));
    }

    #[test]
    fn parses_minutes_only() {
        let dt = parse_iso_datetime("2024-01-15T08:30").unwrap();
        assert_eq!(dt, ymd_hms(2024, 1, 15, 8, 30, 0));
    }

    #[test]
    fn parses_fractional_seconds() {
        let dt = parse_iso_datetime("2024-01-15T08:30:00.250").unwrap();
        assert_eq!(dt.and_utc().timestamp_subsec_millis(), 250);
    }

    #[test]
    fn keeps_wall_clock_of_offset_datetime() {
        let dt = parse_iso_datetime("2024-01-15T08:30:00-03:00").unwrap();
        assert_eq!(dt, ymd_hms(2024, 1, 15, 8, 30, 0));

        let utc = parse_iso_datetime("2024-01-15T08:30:00Z").unwrap();
        assert_eq!(utc, ymd_hms(2024, 1, 15, 8, 30, 0));
    }

    #[test]
    fn bare_date_is_midnight() {
        let dt = parse_iso_datetime("2024-02-29").unwrap();
        assert_eq!(dt, ymd_hms(2024, 2, 29, 0, 0, 0));
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert!(parse_iso_datetime("  2024-01-15T08:30:00 ").is_ok());
    }

    #[test]
    fn rejects_garbage() {
        for input in ["", "yesterday", "2024-13-01", "15/01/2024", "2024-01-15T25:00:00"] {
            let err = parse_iso_datetime(input).unwrap_err();
            assert!(matches!(err, CoreError::InvalidDateTime(ref s) if s == input));
        }
    }

    #[test]
    fn deserialize_adapter_reports_custom_error() {
        #[derive(Debug, Deserialize)]
        struct Wrapper {
            #[serde(deserialize_with = "deserialize")]
            at: NaiveDateTime,
        }

        let ok: Wrapper = serde_json::from_str(r#"{"at":"2024-01-01"}"#).unwrap();
        assert_eq!(ok.at, ymd_hms(2024, 1, 1, 0, 0, 0));

        let err = serde_json::from_str::<Wrapper>(r#"{"at":"nope"}"#).unwrap_err();
        assert!(err.to_string().contains("invalid datetime: nope"));
    }
}
