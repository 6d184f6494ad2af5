//! Lenient timestamp parsing for calendar entry windows.
//!
//! Accepted: RFC 3339 (`Z` or offset), naive `YYYY-MM-DDTHH:MM[:SS[.f]]`
//! (read as UTC, `T` or space separator), and bare dates (midnight UTC).
//! Anything else is treated as absent.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}

/// Resolve a start/end pair.
///
/// Missing or unparseable start becomes `now`, and the end is then always
/// `now + 1 hour` whatever `event_to` holds. With a usable start, a missing
/// or unparseable end becomes start + 1 hour.
pub fn resolve_window(
    event_from: Option<&str>,
    event_to: Option<&str>,
    now: DateTime<Utc>,
) -> (DateTime<Utc>, DateTime<Utc>) {
    match event_from.and_then(parse_timestamp) {
        Some(start) => {
            let end = event_to
                .and_then(parse_timestamp)
                .unwrap_or(start + Duration::hours(1));
            (start, end)
        }
        None => (now, now + Duration::hours(1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn parses_supported_shapes() {
        let ten = utc(2024, 1, 1, 10, 0, 0);
        assert_eq!(parse_timestamp("2024-01-01T10:00:00Z"), Some(ten));
        assert_eq!(parse_timestamp("2024-01-01T12:00:00+02:00"), Some(ten));
        assert_eq!(parse_timestamp("2024-01-01T10:00:00"), Some(ten));
        assert_eq!(parse_timestamp("2024-01-01T10:00"), Some(ten));
        assert_eq!(parse_timestamp("2024-01-01 10:00:00"), Some(ten));
        assert_eq!(parse_timestamp(" 2024-01-01T10:00:00.000 "), Some(ten));
        assert_eq!(parse_timestamp("2024-01-01"), Some(utc(2024, 1, 1, 0, 0, 0)));
    }

    #[test]
    fn rejects_garbage() {
        for raw in ["", "not-a-date", "2024-13-01", "tomorrow at noon", "10:00"] {
            assert_eq!(parse_timestamp(raw), None, "{raw}");
        }
    }

    #[test]
    fn missing_end_is_one_hour_after_start() {
        let now = utc(2030, 6, 1, 0, 0, 0);
        let (start, end) = resolve_window(Some("2024-01-01T10:00:00Z"), None, now);
        assert_eq!(start, utc(2024, 1, 1, 10, 0, 0));
        assert_eq!(end, utc(2024, 1, 1, 11, 0, 0));
    }

    #[test]
    fn malformed_start_falls_back_to_now() {
        let now = utc(2030, 6, 1, 8, 0, 0);
        let (start, end) = resolve_window(Some("not-a-date"), None, now);
        assert_eq!(start, now);
        assert_eq!(end, now + Duration::hours(1));
    }

    #[test]
    fn malformed_end_follows_start() {
        let now = utc(2030, 6, 1, 8, 0, 0);
        let (start, end) = resolve_window(Some("2024-01-01T10:00:00Z"), Some("later"), now);
        assert_eq!(end, start + Duration::hours(1));

    }

    #[test]
    fn missing_start_ignores_end() {
        let now = utc(2030, 6, 1, 8, 0, 0);
        let (start, end) = resolve_window(None, Some("2024-01-02T09:30:00Z"), now);
        assert_eq!(start, now);
        assert_eq!(end, now + Duration::hours(1));
        assert!(end > start);

        let (start, end) = resolve_window(Some("soon"), Some("2031-01-01T00:00:00Z"), now);
        assert_eq!((start, end), (now, now + Duration::hours(1)));
    }

    proptest! {
        #[test]
        fn unparseable_input_never_fails(raw in "[a-zA-Z !?]{0,24}") {
            let now = utc(2025, 3, 3, 3, 3, 3);
            let (start, end) = resolve_window(Some(&raw), Some(&raw), now);
            prop_assert_eq!(start, now);
            prop_assert_eq!(end, now + Duration::hours(1));
        }

        #[test]
        fn valid_start_without_end_spans_one_hour(secs in 0i64..4_000_000_000i64) {
            let start = DateTime::from_timestamp(secs, 0).unwrap();
            let (s, e) = resolve_window(Some(&start.to_rfc3339()), None, Utc::now());
            prop_assert_eq!(s, start);
            prop_assert_eq!(e - s, Duration::hours(1));
        }
    }
}
