//! Post date parsing and formatting with strftime-style format strings.
//!
//! Post dates are written by hand in `info.ini` using the comic's
//! `[Comic Settings] Date format` (e.g. `%B %d, %Y` → `January 1, 1903`).
//! Formats without a time component resolve to midnight.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::fmt::Write;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DateError {
    #[error("Post date {value:?} does not match date format {format:?}: {reason}")]
    Parse {
        value: String,
        format: String,
        reason: String,
    },
    #[error("Invalid date format {0:?}")]
    Format(String),
    #[error("Unknown timezone {name:?}: {reason}")]
    Timezone { name: String, reason: String },
}

/// Parse a post date. Date-only formats yield midnight.
pub fn parse_post_date(value: &str, format: &str) -> Result<NaiveDateTime, DateError> {
    let value = value.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
        return Ok(dt);
    }
    NaiveDate::parse_from_str(value, format)
        .map(|d| d.and_time(chrono::NaiveTime::MIN))
        .map_err(|e| DateError::Parse {
            value: value.to_string(),
            format: format.to_string(),
            reason: e.to_string(),
        })
}

/// Render a date with a strftime-style format.
///
/// Invalid specifiers are reported as errors instead of panicking inside
/// `Display`.
pub fn format_date(dt: &NaiveDateTime, format: &str) -> Result<String, DateError> {
    let items: Vec<Item> = StrftimeItems::new(format).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(DateError::Format(format.to_string()));
    }
    let mut out = String::new();
    write!(out, "{}", dt.format_with_items(items.into_iter()))
        .map_err(|_| DateError::Format(format.to_string()))?;
    Ok(out)
}

pub fn parse_timezone(name: &str) -> Result<Tz, DateError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|e| DateError::Timezone {
            name: name.to_string(),
            reason: e.to_string(),
        })
}

/// Interpret a wall-clock post date in the comic's timezone.
///
/// Ambiguous times (DST fall-back) take the earlier instant; times that fall
/// in a DST gap are read as UTC.
pub fn localize(post_date: &NaiveDateTime, tz: Tz) -> DateTime<Tz> {
    tz.from_local_datetime(post_date)
        .earliest()
        .unwrap_or_else(|| tz.from_utc_datetime(post_date))
}

/// True when the post date is still in the future for readers in `tz`.
pub fn is_scheduled(post_date: &NaiveDateTime, tz: Tz, now: DateTime<Utc>) -> bool {
    localize(post_date, tz) > now.with_timezone(&tz)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn date_only_format_is_midnight() {
        let dt = parse_post_date("January 1, 1903", "%B %d, %Y").unwrap();
        assert_eq!(dt, date(1903, 1, 1));
    }

    #[test]
    fn datetime_format_keeps_time() {
        let dt = parse_post_date("2024-03-05 14:30", "%Y-%m-%d %H:%M").unwrap();
        assert_eq!(dt.format("%H:%M").to_string(), "14:30");
    }

    #[test]
    fn mismatched_date_is_error() {
        let err = parse_post_date("yesterday", "%B %d, %Y").unwrap_err();
        assert!(matches!(err, DateError::Parse { .. }));
    }

    #[test]
    fn format_date_reformats_for_archive() {
        let s = format_date(&date(2021, 7, 4), "%b %d, %Y").unwrap();
        assert_eq!(s, "Jul 04, 2021");
    }

    #[test]
    fn format_date_rejects_bad_specifier() {
        assert!(matches!(
            format_date(&date(2021, 7, 4), "%Y %"),
            Err(DateError::Format(_))
        ));
    }

    #[test]
    fn unknown_timezone_is_error() {
        assert!(parse_timezone("Mars/Olympus_Mons").is_err());
        assert_eq!(parse_timezone("US/Eastern").unwrap(), chrono_tz::US::Eastern);
    }

    #[test]
    fn scheduled_compares_in_comic_timezone() {
        // 2024-01-01 00:00 in New York is 05:00 UTC.
        let post = date(2024, 1, 1);
        let tz = chrono_tz::America::New_York;
        let before = Utc.with_ymd_and_hms(2024, 1, 1, 4, 59, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2024, 1, 1, 5, 0, 0).unwrap();
        assert!(is_scheduled(&post, tz, before));
        assert!(!is_scheduled(&post, tz, after));
    }
}
