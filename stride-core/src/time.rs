//! Time utilities: lenient date parsing and timezone-aware "today".
//!
//! Dates arrive as strings from forms and the persistence layer. A value that
//! does not parse is treated as absent rather than an error, so one bad record
//! never breaks a listing.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};

const NAIVE_FORMATS: [&str; 5] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse a calendar date with optional time. Date-only input maps to midnight.
///
/// RFC 3339 input keeps its wall-clock part; the offset is dropped because due
/// dates are calendar values, not instants.
pub fn parse_date_lenient(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ndt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

/// Parse an instant. Offset-less input is read as UTC.
pub fn parse_timestamp_lenient(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    parse_date_lenient(s).map(|ndt| ndt.and_utc())
}

/// Wall-clock time in `tz` for the instant `now`.
pub fn local_naive(now: DateTime<Utc>, tz: Tz) -> NaiveDateTime {
    now.with_timezone(&tz).naive_local()
}

/// Calendar day in `tz` for the instant `now`.
pub fn local_today(now: DateTime<Utc>, tz: Tz) -> NaiveDate {
    local_naive(now, tz).date()
}

/// A stored date field as found on disk: text, or anything else.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawDate {
    Text(String),
    Other(IgnoredAny),
}

impl RawDate {
    fn text(self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s),
            Self::Other(_) => None,
        }
    }
}

/// Serde helper: `Option<NaiveDateTime>` where malformed values (bad strings,
/// numbers, objects) become `None`.
pub fn lenient_naive<'de, D>(de: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<RawDate> = Option::deserialize(de)?;
    Ok(raw
        .and_then(RawDate::text)
        .and_then(|s| parse_date_lenient(&s)))
}

/// Serde helper: `Option<DateTime<Utc>>`, lenient like [`lenient_naive`].
pub fn lenient_utc<'de, D>(de: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<RawDate> = Option::deserialize(de)?;
    Ok(raw
        .and_then(RawDate::text)
        .and_then(|s| parse_timestamp_lenient(&s)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn date_only_is_midnight() {
        let d = parse_date_lenient("2025-03-05").unwrap();
        assert_eq!(d.to_string(), "2025-03-05 00:00:00");
    }

    #[test]
    fn rfc3339_keeps_wall_clock() {
        let d = parse_date_lenient("2025-03-05T09:30:00-06:00").unwrap();
        assert_eq!(d.to_string(), "2025-03-05 09:30:00");
    }

    #[test]
    fn form_input_without_seconds() {
        let d = parse_date_lenient("2025-03-05T14:15").unwrap();
        assert_eq!(d.to_string(), "2025-03-05 14:15:00");
    }

    #[test]
    fn garbage_is_absent() {
        assert!(parse_date_lenient("next tuesday").is_none());
        assert!(parse_date_lenient("").is_none());
        assert!(parse_timestamp_lenient("2025-13-45").is_none());
    }

    #[test]
    fn today_respects_timezone() {
        // 03:00 UTC is still the previous evening in Chicago.
        let now = Utc.with_ymd_and_hms(2026, 2, 20, 3, 0, 0).unwrap();
        let tz: Tz = "America/Chicago".parse().unwrap();
        assert_eq!(local_today(now, tz), NaiveDate::from_ymd_opt(2026, 2, 19).unwrap());
    }
}
