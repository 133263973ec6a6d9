//! Timestamp helpers for backend date strings

use chrono::{DateTime, NaiveDateTime, Utc};

/// Parse a backend timestamp
///
/// The API emits naive ISO 8601 timestamps in UTC (`2024-03-01T10:00:00.123456`);
/// RFC 3339 strings with an offset are accepted too.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Fractional minutes from `start` to `end`
pub fn minutes_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_milliseconds() as f64 / 60_000.0
}

/// Human-readable duration, e.g. `45m`, `2h 05m`, `3d 4h`
pub fn format_minutes(minutes: f64) -> String {
    if !minutes.is_finite() || minutes <= 0.0 {
        return "0m".to_string();
    }

    let total = minutes.round() as u64;
    let days = total / (24 * 60);
    let hours = (total % (24 * 60)) / 60;
    let mins = total % 60;

    if days > 0 {
        format!("{}d {}h", days, hours)
    } else if hours > 0 {
        format!("{}h {:02}m", hours, mins)
    } else {
        format!("{}m", mins)
    }
}

/// How long ago `value` happened, relative to `now`
pub fn format_age(value: &str, now: DateTime<Utc>) -> Option<String> {
    let then = parse_timestamp(value)?;
    Some(format!("{} ago", format_minutes(minutes_between(then, now))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_naive_and_offset() {
        let naive = parse_timestamp("2024-03-01T10:00:00.500000").unwrap();
        let offset = parse_timestamp("2024-03-01T12:00:00.5+02:00").unwrap();
        assert_eq!(naive, offset);

        assert!(parse_timestamp("2024-03-01 10:00:00").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_minutes_between() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 3, 1, 11, 30, 0).unwrap();
        assert_eq!(minutes_between(start, end), 90.0);
    }

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_minutes(0.0), "0m");
        assert_eq!(format_minutes(44.6), "45m");
        assert_eq!(format_minutes(125.0), "2h 05m");
        assert_eq!(format_minutes(3.0 * 1440.0 + 250.0), "3d 4h");
        assert_eq!(format_minutes(f64::NAN), "0m");
    }

    #[test]
    fn test_format_age() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(format_age("2024-03-01T11:50:00", now).as_deref(), Some("10m ago"));
    }
}
