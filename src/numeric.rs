//! Numeric and timestamp normalisation
//!
//! Payloads from external collaborators carry magnitudes as numbers, numeric
//! strings, `null`, or not at all. Everything is coerced here, once, into a
//! [`Numeric`] that is either a finite `f64` or explicitly [`Numeric::Absent`].
//! Nothing downstream ever sees `NaN`.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::{self, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

use crate::error::IngestionError;

/// Placeholder rendered for absent values
pub const ABSENT_PLACEHOLDER: &str = "—";

/// A finite number, or the explicit "absent" sentinel
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Numeric {
    /// A finite floating-point value
    Value(f64),
    /// Missing, null, unparseable or non-finite input
    #[default]
    Absent,
}

impl Numeric {
    /// Wrap an `f64`, mapping `NaN` and infinities to `Absent`
    pub fn from_f64(value: f64) -> Self {
        if value.is_finite() {
            Numeric::Value(value)
        } else {
            Numeric::Absent
        }
    }

    /// Parse a numeric string; surrounding whitespace is ignored
    ///
    /// Empty strings and anything `f64::from_str` rejects become `Absent`.
    pub fn from_str_lenient(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Numeric::Absent;
        }
        match trimmed.parse::<f64>() {
            Ok(v) => Self::from_f64(v),
            Err(_) => {
                tracing::warn!(value = raw, "Unparseable numeric string treated as absent");
                Numeric::Absent
            }
        }
    }

    /// Normalise an untyped JSON value
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Number(n) => n.as_f64().map(Self::from_f64).unwrap_or_default(),
            serde_json::Value::String(s) => Self::from_str_lenient(s),
            _ => Numeric::Absent,
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Numeric::Value(v) => Some(*v),
            Numeric::Absent => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Numeric::Absent)
    }

    /// Resolve to a number, substituting `default` when absent
    ///
    /// Only for fields where the domain treats missing as a concrete value.
    pub fn unwrap_or(&self, default: f64) -> f64 {
        self.value().unwrap_or(default)
    }
}

impl From<f64> for Numeric {
    fn from(value: f64) -> Self {
        Self::from_f64(value)
    }
}

impl From<Option<f64>> for Numeric {
    fn from(value: Option<f64>) -> Self {
        value.map(Self::from_f64).unwrap_or_default()
    }
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Numeric::Value(v) => write!(f, "{}", v),
            Numeric::Absent => write!(f, "{}", ABSENT_PLACEHOLDER),
        }
    }
}

impl Serialize for Numeric {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Numeric::Value(v) => serializer.serialize_f64(*v),
            Numeric::Absent => serializer.serialize_none(),
        }
    }
}

struct NumericVisitor;

impl<'de> Visitor<'de> for NumericVisitor {
    type Value = Numeric;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a number, a numeric string, or null")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Numeric, E> {
        Ok(Numeric::from_f64(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Numeric, E> {
        Ok(Numeric::from_f64(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Numeric, E> {
        Ok(Numeric::from_f64(v as f64))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Numeric, E> {
        Ok(Numeric::from_str_lenient(v))
    }

    fn visit_bool<E: de::Error>(self, _v: bool) -> Result<Numeric, E> {
        Ok(Numeric::Absent)
    }

    fn visit_none<E: de::Error>(self) -> Result<Numeric, E> {
        Ok(Numeric::Absent)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Numeric, E> {
        Ok(Numeric::Absent)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Numeric, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(NumericVisitor)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Numeric, A::Error>
    where
        A: SeqAccess<'de>,
    {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(Numeric::Absent)
    }

    fn visit_map<A>(self, mut map: A) -> Result<Numeric, A::Error>
    where
        A: MapAccess<'de>,
    {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(Numeric::Absent)
    }
}

impl<'de> Deserialize<'de> for Numeric {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(NumericVisitor)
    }
}

/// Parse an ISO-8601 timestamp leniently
///
/// RFC 3339 is tried first; a naive `YYYY-MM-DDTHH:MM:SS[.f]` (or with a space
/// separator) is read as UTC. Anything else is absent.
pub fn normalize_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    let parsed = parse_timestamp(raw);
    if parsed.is_none() {
        tracing::warn!(value = raw, "Unparseable timestamp treated as absent");
    }
    parsed
}

/// Parse an ISO-8601 timestamp, reporting failure
pub fn parse_timestamp_strict(field: &str, raw: &str) -> Result<DateTime<Utc>, IngestionError> {
    parse_timestamp(raw.trim()).ok_or_else(|| IngestionError::InvalidTimestamp {
        field: field.to_string(),
        value: raw.to_string(),
    })
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_numbers_pass_through() {
        assert_eq!(Numeric::from_f64(42.5), Numeric::Value(42.5));
        assert_eq!(Numeric::from_json(&json!(7)), Numeric::Value(7.0));
        assert_eq!(Numeric::from_json(&json!(-3.25)), Numeric::Value(-3.25));
    }

    #[test]
    fn test_nan_and_infinity_become_absent() {
        assert!(Numeric::from_f64(f64::NAN).is_absent());
        assert!(Numeric::from_f64(f64::INFINITY).is_absent());
        assert!(Numeric::from_str_lenient("NaN").is_absent());
        assert!(Numeric::from_str_lenient("inf").is_absent());
    }

    #[test]
    fn test_strings() {
        assert_eq!(Numeric::from_str_lenient("12.5"), Numeric::Value(12.5));
        assert_eq!(Numeric::from_str_lenient("  48 "), Numeric::Value(48.0));
        assert!(Numeric::from_str_lenient("").is_absent());
        assert!(Numeric::from_str_lenient("twelve").is_absent());
        assert!(Numeric::from_str_lenient("12kg").is_absent());
    }

    #[test]
    fn test_non_numeric_json() {
        assert!(Numeric::from_json(&json!(null)).is_absent());
        assert!(Numeric::from_json(&json!(true)).is_absent());
        assert!(Numeric::from_json(&json!([1, 2])).is_absent());
    }

    #[test]
    fn test_deserialize_field_shapes() {
        #[derive(Deserialize)]
        struct Payload {
            #[serde(default)]
            score: Numeric,
        }

        let cases = [
            (r#"{"score": 3}"#, Numeric::Value(3.0)),
            (r#"{"score": "3.5"}"#, Numeric::Value(3.5)),
            (r#"{"score": null}"#, Numeric::Absent),
            (r#"{"score": "n/a"}"#, Numeric::Absent),
            (r#"{"score": {"x": 1}}"#, Numeric::Absent),
            (r#"{}"#, Numeric::Absent),
        ];
        for (raw, expected) in cases {
            let payload: Payload = serde_json::from_str(raw).unwrap();
            assert_eq!(payload.score, expected, "input {}", raw);
        }
    }

    #[test]
    fn test_serialize_absent_as_null() {
        assert_eq!(serde_json::to_string(&Numeric::Absent).unwrap(), "null");
        assert_eq!(serde_json::to_string(&Numeric::Value(1.5)).unwrap(), "1.5");
    }

    #[test]
    fn test_display_and_defaults() {
        assert_eq!(Numeric::Absent.to_string(), ABSENT_PLACEHOLDER);
        assert_eq!(Numeric::Absent.unwrap_or(0.0), 0.0);
        assert_eq!(Numeric::Value(2.0).unwrap_or(0.0), 2.0);
    }

    #[test]
    fn test_timestamps() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 10, 30, 0).unwrap();
        assert_eq!(normalize_timestamp(Some("2024-03-01T10:30:00Z")), Some(expected));
        assert_eq!(normalize_timestamp(Some("2024-03-01T12:30:00+02:00")), Some(expected));
        assert_eq!(normalize_timestamp(Some("2024-03-01T10:30:00.000")), Some(expected));
        assert_eq!(normalize_timestamp(Some("2024-03-01 10:30:00")), Some(expected));
        assert_eq!(normalize_timestamp(Some("not a date")), None);
        assert_eq!(normalize_timestamp(Some("")), None);
        assert_eq!(normalize_timestamp(None), None);
    }

    #[test]
    fn test_strict_timestamp_reports_field() {
        let err = parse_timestamp_strict("last_set_timestamp", "soon").unwrap_err();
        assert!(err.to_string().contains("last_set_timestamp"));
    }
}
