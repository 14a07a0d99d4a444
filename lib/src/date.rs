//! Post dates.
//!
//! Dates are kept as the strings authors wrote in front matter. They are only
//! interpreted to order listings and to format them for display, always in
//! UTC so that the same date renders identically everywhere.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

const NAIVE_DATE_TIMES: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Parses an ISO-8601 date (`2024-03-01`), an RFC 3339 timestamp, or a naive
/// date-time. Returns `None` for anything else.
pub fn parse(date: &str) -> Option<DateTime<Utc>> {
    let date = date.trim();
    if let Ok(datetime) = DateTime::parse_from_rfc3339(date) {
        return Some(datetime.with_timezone(&Utc));
    }

    for format in NAIVE_DATE_TIMES {
        if let Ok(naive) = NaiveDateTime::parse_from_str(date, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    Some(Utc.from_utc_datetime(&day.and_hms_opt(0, 0, 0)?))
}

/// Formats `date` with a `strftime`-like `format`, e.g. `"%Y年%m月%d日"`.
pub fn format(date: &str, format: &str) -> Option<String> {
    parse(date).map(|date| date.format(format).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_shapes() {
        let day = parse("2024-03-01").unwrap();
        assert_eq!(day.to_rfc3339(), "2024-03-01T00:00:00+00:00");

        let zoned = parse("2024-03-01T08:30:00+08:00").unwrap();
        assert_eq!(zoned.to_rfc3339(), "2024-03-01T00:30:00+00:00");

        let naive = parse(" 2024-03-01 12:00:00 ").unwrap();
        assert_eq!(naive.to_rfc3339(), "2024-03-01T12:00:00+00:00");

        assert!(parse("yesterday").is_none());
        assert!(parse("").is_none());
    }

    #[test]
    fn formats_in_utc() {
        assert_eq!(format("2023-12-31T23:30:00-02:00", "%Y-%m-%d").unwrap(), "2024-01-01");
        assert_eq!(format("2024-03-01", "%Y年%m月%d日").unwrap(), "2024年03月01日");
        assert!(format("soon", "%Y").is_none());
    }
}
