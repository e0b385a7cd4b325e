//! Cell rendering for the CSV tables.
//!
//! Nulls and undefined means are written as empty cells.

use chrono::{NaiveDate, NaiveDateTime};

/// Layout used for every timestamp column at rest.
/// Fractional seconds are only written when non-zero.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Layout used for calendar-date columns.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Render a statistic in shortest round-trip form, keeping a trailing `.0`
/// on integral values. `NaN` becomes an empty cell.
///
/// # Examples
///
/// ```
/// use pipeline_core::formatting::format_float;
///
/// assert_eq!(format_float(3.0), "3.0");
/// assert_eq!(format_float(7.0 / 3.0), "2.3333333333333335");
/// assert_eq!(format_float(f64::NAN), "");
/// ```
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        format!("{:?}", value)
    }
}

/// Render a raw score or other source number: integral values are written
/// without a fractional part.
///
/// # Examples
///
/// ```
/// use pipeline_core::formatting::format_number;
///
/// assert_eq!(format_number(5.0), "5");
/// assert_eq!(format_number(4.5), "4.5");
/// ```
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        format!("{}", value)
    }
}

/// Render a timestamp cell.
pub fn format_timestamp(value: &NaiveDateTime) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

/// Render a calendar-date cell.
pub fn format_date(value: &NaiveDate) -> String {
    value.format(DATE_FORMAT).to_string()
}

/// Render an optional cell with `f`, writing `None` as an empty cell.
pub fn format_optional<T>(value: Option<&T>, f: impl Fn(&T) -> String) -> String
where
    T: ?Sized,
{
    value.map(f).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_float_fraction() {
        assert_eq!(format_float(2.0 / 3.0), "0.6666666666666666");
        assert_eq!(format_float(0.0), "0.0");
    }

    #[test]
    fn test_format_number_negative_and_nan() {
        assert_eq!(format_number(-1.0), "-1");
        assert_eq!(format_number(f64::NAN), "");
    }

    #[test]
    fn test_format_timestamp_keeps_nonzero_fraction() {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_milli_opt(3, 4, 5, 600)
            .unwrap();
        assert_eq!(format_timestamp(&ts), "2024-01-02 03:04:05.600");
        let whole = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        assert_eq!(format_timestamp(&whole), "2024-01-02 03:04:05");
    }

    #[test]
    fn test_format_date() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(format_date(&d), "2024-03-01");
    }

    #[test]
    fn test_format_optional() {
        let some = Some("x".to_string());
        assert_eq!(format_optional(some.as_ref(), |s| s.clone()), "x");
        assert_eq!(format_optional(None::<&String>, |s| s.clone()), "");
    }
}
