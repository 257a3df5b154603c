//! Timestamp parsing: absolute ISO-8601 style values and relative phrases
//! such as "3 days ago" or "2h".

use std::sync::LazyLock;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;

/// Naive layouts accepted after RFC 3339 fails. Interpreted as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Layouts carrying an explicit offset that RFC 3339 parsing rejects.
const OFFSET_DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M:%S%.f%z"];

/// Parse an absolute timestamp.
///
/// A trailing `Z` is equivalent to `+00:00`. Values without an offset are UTC;
/// a bare date is midnight UTC.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let with_offset = raw
        .strip_suffix('Z')
        .or_else(|| raw.strip_suffix('z'))
        .map_or_else(|| raw.to_string(), |rest| format!("{rest}+00:00"));

    if let Ok(ts) = DateTime::parse_from_rfc3339(&with_offset) {
        return Some(ts.with_timezone(&Utc));
    }

    for fmt in OFFSET_DATETIME_FORMATS {
        if let Ok(ts) = DateTime::parse_from_str(&with_offset, fmt) {
            return Some(ts.with_timezone(&Utc));
        }
    }

    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Units recognized in relative phrases. On equal positions the earlier entry wins.
static RELATIVE_UNITS: LazyLock<Vec<(Regex, Duration)>> = LazyLock::new(|| {
    [
        (r"(\d+)\s*(?:hours?|hrs?|h)\b", Duration::hours(1)),
        (r"(\d+)\s*(?:days?|d)\b", Duration::days(1)),
        (r"(\d+)\s*(?:weeks?|wks?|w)\b", Duration::weeks(1)),
        (r"(\d+)\s*(?:months?|mos?)\b", Duration::days(30)),
        (r"(\d+)\s*(?:minutes?|mins?|m)\b", Duration::minutes(1)),
        (r"(\d+)\s*(?:years?|yrs?|y)\b", Duration::days(365)),
    ]
    .into_iter()
    .map(|(pattern, unit)| (Regex::new(pattern).expect("Invalid relative date regex"), unit))
    .collect()
});

/// Parse a relative phrase ("5 hours ago", "2d", "1 mo") against `now`.
///
/// The first amount in the text decides, so "3d • Edited 1h" is three days.
/// Returns `None` if no unit is recognized.
#[must_use]
pub fn parse_relative(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let lowered = text.trim().to_lowercase();
    if lowered.is_empty() {
        return None;
    }
    if lowered == "now" || lowered.starts_with("just now") {
        return Some(now);
    }

    let (caps, unit) = RELATIVE_UNITS
        .iter()
        .filter_map(|(re, unit)| re.captures(&lowered).map(|caps| (caps, unit)))
        .min_by_key(|(caps, _)| caps.get(0).map_or(usize::MAX, |m| m.start()))?;
    let n = caps[1].parse::<i32>().ok()?;
    unit.checked_mul(n)
        .and_then(|offset| now.checked_sub_signed(offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_rfc3339_with_z() {
        assert_eq!(
            parse_timestamp("2024-02-20T08:30:00Z"),
            Some(Utc.with_ymd_and_hms(2024, 2, 20, 8, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_parse_with_offset() {
        assert_eq!(
            parse_timestamp("2024-02-20T10:30:00+02:00"),
            Some(Utc.with_ymd_and_hms(2024, 2, 20, 8, 30, 0).unwrap())
        );
        assert_eq!(
            parse_timestamp("2024-02-20 10:30:00+02:00"),
            Some(Utc.with_ymd_and_hms(2024, 2, 20, 8, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_parse_naive_is_utc() {
        assert_eq!(
            parse_timestamp("2024-02-20T08:30:00.250"),
            Some(
                Utc.with_ymd_and_hms(2024, 2, 20, 8, 30, 0).unwrap()
                    + Duration::milliseconds(250)
            )
        );
        assert_eq!(
            parse_timestamp("2024-02-20 08:30:00"),
            Some(Utc.with_ymd_and_hms(2024, 2, 20, 8, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_parse_bare_date() {
        assert_eq!(
            parse_timestamp(" 2024-02-20 "),
            Some(Utc.with_ymd_and_hms(2024, 2, 20, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_parse_garbage() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("2024-13-45"), None);
    }

    #[test]
    fn test_relative_long_forms() {
        assert_eq!(parse_relative("5 hours ago", now()), Some(now() - Duration::hours(5)));
        assert_eq!(parse_relative("3 days ago", now()), Some(now() - Duration::days(3)));
        assert_eq!(parse_relative("2 weeks ago", now()), Some(now() - Duration::weeks(2)));
        assert_eq!(parse_relative("1 month ago", now()), Some(now() - Duration::days(30)));
        assert_eq!(parse_relative("1 year ago", now()), Some(now() - Duration::days(365)));
        assert_eq!(parse_relative("45 minutes ago", now()), Some(now() - Duration::minutes(45)));
    }

    #[test]
    fn test_relative_short_forms() {
        assert_eq!(parse_relative("2h • Edited", now()), Some(now() - Duration::hours(2)));
        assert_eq!(parse_relative("3d", now()), Some(now() - Duration::days(3)));
        assert_eq!(parse_relative("1w", now()), Some(now() - Duration::weeks(1)));
        assert_eq!(parse_relative("4mo", now()), Some(now() - Duration::days(120)));
        assert_eq!(parse_relative("30m", now()), Some(now() - Duration::minutes(30)));
    }

    #[test]
    fn test_relative_uses_first_amount_in_text() {
        assert_eq!(parse_relative("3d • Edited 1h", now()), Some(now() - Duration::days(3)));
        assert_eq!(parse_relative("2w • 5h", now()), Some(now() - Duration::weeks(2)));
        assert_eq!(parse_relative("Edited 1h ago", now()), Some(now() - Duration::hours(1)));
    }

    #[test]
    fn test_relative_crosses_month_boundary() {
        // 1 March minus 5 days lands in February rather than underflowing the day field
        assert_eq!(
            parse_relative("5 days ago", now()),
            Some(Utc.with_ymd_and_hms(2024, 2, 25, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_relative_now_and_unknown() {
        assert_eq!(parse_relative("Just now", now()), Some(now()));
        assert_eq!(parse_relative("Promoted", now()), None);
        assert_eq!(parse_relative("", now()), None);
    }
}
