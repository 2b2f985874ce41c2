use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

/// Parses the timestamp shapes found in `meta.last_refresh_at` / `fetched_at`:
/// RFC 3339 with offset or `Z`, or a naive ISO-8601 datetime taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// The form written by this crate: `2026-10-14T08:30:00Z`.
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parses_rfc3339_and_naive() {
        let expected = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2025-03-01T12:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2025-03-01T13:00:00+01:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-03-01T12:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-03-01T12:00:00.000000"), Some(expected));
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn test_format_round_trips() {
        let dt = Utc.with_ymd_and_hms(2026, 10, 14, 8, 30, 0).unwrap();
        assert_eq!(format_timestamp(&dt), "2026-10-14T08:30:00Z");
        assert_eq!(parse_timestamp(&format_timestamp(&dt)), Some(dt));
    }
}
