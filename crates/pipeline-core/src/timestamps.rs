use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use tracing::debug;

/// Naive datetime layouts accepted for review timestamps.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Date-only layouts; these resolve to midnight.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

// ── TimestampProcessor ────────────────────────────────────────────────────────

/// Coercive timestamp parsing for review `at` values.
///
/// Values carrying an offset are converted to UTC and returned as a naive UTC
/// wall-clock time, so every row in a table shares one timeline. Anything that
/// cannot be understood becomes `None`; parsing never fails hard.
pub struct TimestampProcessor;

impl TimestampProcessor {
    /// Attempt to parse a [`serde_json::Value`].
    ///
    /// * `null`        → `None`
    /// * JSON string   → RFC 3339 or one of the naive ISO-8601 layouts
    /// * JSON number   → Unix timestamp in seconds
    pub fn parse(value: &Value) -> Option<NaiveDateTime> {
        match value {
            Value::Null => None,
            Value::String(s) => Self::parse_str(s),
            Value::Number(n) => {
                if let Some(secs) = n.as_i64() {
                    DateTime::from_timestamp(secs, 0).map(|dt| dt.naive_utc())
                } else if let Some(f) = n.as_f64() {
                    let secs = f.trunc() as i64;
                    let nanos = (f.fract() * 1_000_000_000.0).round() as u32;
                    DateTime::from_timestamp(secs, nanos).map(|dt| dt.naive_utc())
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Parse a text cell or JSON string.
    pub fn parse_str(s: &str) -> Option<NaiveDateTime> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }

        let normalised = match s.strip_suffix('Z') {
            Some(stripped) => format!("{}+00:00", stripped),
            None => s.to_string(),
        };
        if let Ok(dt) = DateTime::parse_from_rfc3339(&normalised) {
            return Some(dt.naive_utc());
        }
        // pandas-style "2024-01-01 10:00:00+00:00"
        if let Ok(dt) = DateTime::parse_from_str(&normalised, "%Y-%m-%d %H:%M:%S%.f%:z") {
            return Some(dt.naive_utc());
        }

        for fmt in DATETIME_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
                return Some(naive);
            }
        }
        for fmt in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
                return date.and_hms_opt(0, 0, 0);
            }
        }

        debug!("could not parse timestamp \"{}\"", s);
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    #[test]
    fn test_parse_null_returns_none() {
        assert!(TimestampProcessor::parse(&json!(null)).is_none());
    }

    #[test]
    fn test_parse_naive_iso_truncates_to_day() {
        let dt = TimestampProcessor::parse(&json!("2024-03-01T10:00:00")).unwrap();
        assert_eq!(dt.date(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(dt.hour(), 10);
    }

    #[test]
    fn test_parse_fractional_seconds() {
        let dt = TimestampProcessor::parse(&json!("2024-03-01T10:00:00.250")).unwrap();
        assert_eq!(dt.nanosecond(), 250_000_000);
    }

    #[test]
    fn test_parse_z_suffix() {
        let dt = TimestampProcessor::parse(&json!("2024-01-15T10:30:00Z")).unwrap();
        assert_eq!(dt.day(), 15);
        assert_eq!(dt.hour(), 10);
    }

    #[test]
    fn test_parse_offset_converts_to_utc() {
        let dt = TimestampProcessor::parse(&json!("2024-03-20T02:00:00+05:00")).unwrap();
        assert_eq!(dt.day(), 19);
        assert_eq!(dt.hour(), 21);
    }

    #[test]
    fn test_parse_space_separated_with_offset() {
        let dt = TimestampProcessor::parse_str("2024-01-01 10:00:00+00:00").unwrap();
        assert_eq!(dt.hour(), 10);
    }

    #[test]
    fn test_parse_space_separated_written_form() {
        let dt = TimestampProcessor::parse_str("2024-01-15 12:30:45").unwrap();
        assert_eq!(dt.minute(), 30);
        assert_eq!(dt.second(), 45);
    }

    #[test]
    fn test_parse_date_only() {
        let dt = TimestampProcessor::parse(&json!("2024-06-01")).unwrap();
        assert_eq!(dt.month(), 6);
        assert_eq!(dt.hour(), 0);
    }

    #[test]
    fn test_parse_unix_seconds() {
        let dt = TimestampProcessor::parse(&json!(0)).unwrap();
        assert_eq!(dt.year(), 1970);
        let dt = TimestampProcessor::parse(&json!(1_700_000_000.5f64)).unwrap();
        assert_eq!(dt.year(), 2023);
    }

    #[test]
    fn test_parse_garbage_coerces_to_none() {
        assert!(TimestampProcessor::parse(&json!("yesterday-ish")).is_none());
        assert!(TimestampProcessor::parse(&json!("")).is_none());
        assert!(TimestampProcessor::parse(&json!({"at": 1})).is_none());
    }
}
