//! Ordered key-synonym lookup over raw JSON records.
//!
//! Raw records from the app store use several spellings for the same logical
//! field. Each logical field gets an explicit candidate list that is probed in
//! order; the first present, non-null value wins.

use serde_json::Value;

/// Candidate keys for the application identifier in a metadata record.
pub const APP_ID_KEYS: &[&str] = &["appId", "app_id", "appID"];

/// Candidate keys for the application display name in a review record.
pub const APP_NAME_KEYS: &[&str] = &["appName", "app_name", "appTitle"];

/// Key the reader attaches to every review with the filename-derived app id.
pub const SOURCE_APP_ID_KEY: &str = "_source_app_id";

/// Typed accessors for loosely-shaped JSON records.
pub struct FieldLookup;

impl FieldLookup {
    /// Return the first value among `keys` that is present and not `null`.
    pub fn first_present<'a>(record: &'a Value, keys: &[&str]) -> Option<&'a Value> {
        keys.iter()
            .filter_map(|&key| record.get(key))
            .find(|v| !v.is_null())
    }

    /// Direct lookup of one key; `null` and absent both map to `None`.
    pub fn get<'a>(record: &'a Value, key: &str) -> Option<&'a Value> {
        Self::first_present(record, &[key])
    }

    /// Render a scalar as text. Strings are taken verbatim, numbers and
    /// booleans through their JSON form; arrays and objects are serialised.
    pub fn as_text(value: &Value) -> Option<String> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Coerce a JSON number or numeric string to `f64`.
    pub fn as_number(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
            _ => None,
        }
    }

    /// Coerce a JSON integer, integral float or integer string to `i64`.
    pub fn as_integer(value: &Value) -> Option<i64> {
        match value {
            Value::Number(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.is_finite())
                    .map(|f| f as i64)
            }),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
    }

    /// First present synonym rendered as text.
    pub fn text(record: &Value, keys: &[&str]) -> Option<String> {
        Self::first_present(record, keys).and_then(Self::as_text)
    }
}
