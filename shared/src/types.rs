//! Common types used across the platform

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Shape of a collection payload as received from the upstream API
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionShape {
    Paginated,
    Bare,
    Unrecognized,
}

/// Normalize a list payload into a plain array of records.
///
/// `results` wins when present, a bare array is taken as is, anything else
/// is an empty collection.
pub fn normalize_collection(payload: Value) -> (Vec<Value>, CollectionShape) {
    match payload {
        Value::Object(mut map) => match map.remove("results") {
            Some(Value::Array(items)) => (items, CollectionShape::Paginated),
            _ => (Vec::new(), CollectionShape::Unrecognized),
        },
        Value::Array(items) => (items, CollectionShape::Bare),
        _ => (Vec::new(), CollectionShape::Unrecognized),
    }
}

/// Records decoded from a normalized collection
#[derive(Debug, Clone)]
pub struct Decoded<T> {
    pub records: Vec<T>,
    /// Number of entries that could not be decoded and were dropped
    pub skipped: usize,
}

/// Decode every entry independently so one malformed record does not empty
/// the whole collection
pub fn decode_records<T: DeserializeOwned>(items: Vec<Value>) -> Decoded<T> {
    let total = items.len();
    let records: Vec<T> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect();
    Decoded {
        skipped: total - records.len(),
        records,
    }
}

/// Lenient field deserializers.
///
/// The upstream serializes decimals as strings, ids either bare or as nested
/// objects, and leaves many fields null. Absent or unparseable values become
/// zero/None instead of rejecting the record.
pub mod de {
    use std::str::FromStr;

    use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn decimal_from_value(value: &Value) -> Option<Decimal> {
        let text = match value {
            Value::Number(n) => n.to_string(),
            Value::String(s) => s.trim().to_string(),
            _ => return None,
        };
        Decimal::from_str(&text)
            .or_else(|_| Decimal::from_scientific(&text))
            .ok()
    }

    pub fn decimal_or_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
        Ok(optional_decimal(deserializer)?.unwrap_or(Decimal::ZERO))
    }

    pub fn optional_decimal<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Decimal>, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(decimal_from_value))
    }

    pub fn id_from_value(value: &Value) -> Option<i64> {
        match value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            Value::Object(map) => map.get("id").and_then(id_from_value),
            _ => None,
        }
    }

    /// Foreign key given as `7`, `"7"` or `{ "id": 7, ... }`
    pub fn optional_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(id_from_value))
    }

    pub fn string_or_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(optional_label(deserializer)?.unwrap_or_default())
    }

    /// Display text for a field that may be a string, a number or a nested
    /// user/supply object
    pub fn optional_label<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(label_from_value))
    }

    fn label_from_value(value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Object(map) => ["nombre_completo", "nombre", "username", "numero"]
                .iter()
                .find_map(|key| map.get(*key).and_then(label_from_value))
                .filter(|label| !label.is_empty()),
            _ => None,
        }
    }

    pub fn bool_or_false<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
    }

    pub fn vec_or_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
    }

    /// Parse RFC 3339 timestamps, naive timestamps (taken as UTC) and plain dates
    pub fn parse_datetime(text: &str) -> Option<DateTime<Utc>> {
        let text = text.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Some(dt.with_timezone(&Utc));
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(dt.and_utc());
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f") {
            return Some(dt.and_utc());
        }
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    }

    pub fn optional_datetime<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::String(s)) => parse_datetime(&s),
            _ => None,
        })
    }
}
