//! Records published by cluster workers.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// An opaque field → value mapping produced by a worker.
pub type Record = Map<String, Value>;

/// Field that carries the arrival time of a stored record.
pub const TIMESTAMP_FIELD: &str = "timestamp";

/// Seconds since the Unix epoch, with millisecond precision.
pub fn epoch_seconds(instant: DateTime<Utc>) -> f64 {
    instant.timestamp_millis() as f64 / 1000.0
}

/// Overwrite the record's `timestamp` field with the arrival instant.
pub fn stamp(record: &mut Record, arrived_at: DateTime<Utc>) {
    let secs = epoch_seconds(arrived_at);
    let value = serde_json::Number::from_f64(secs)
        .map(Value::Number)
        .unwrap_or(Value::Null);
    record.insert(TIMESTAMP_FIELD.to_string(), value);
}

/// Identity of one group in a grouped topic.
///
/// Keys keep the JSON type of the group field, so `3` and `"3"` name
/// different groups. Numbers compare by value (`1` and `1.0` are the same
/// group). Ordering runs null, booleans, numbers, strings, then arrays and
/// objects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupKey {
    Null,
    Bool(bool),
    Number(NumberKey),
    String(String),
    /// Arrays and objects, by their JSON text.
    Composite(String),
}

impl GroupKey {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => GroupKey::Null,
            Value::Bool(b) => GroupKey::Bool(*b),
            Value::Number(n) => {
                GroupKey::Number(NumberKey::new(n.as_f64().unwrap_or(f64::NAN)))
            }
            Value::String(s) => GroupKey::String(s.clone()),
            other => GroupKey::Composite(other.to_string()),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Null => f.write_str("null"),
            GroupKey::Bool(b) => write!(f, "{}", b),
            GroupKey::Number(n) => write!(f, "{}", n.0),
            GroupKey::String(s) | GroupKey::Composite(s) => f.write_str(s),
        }
    }
}

/// Numeric group value with total equality and ordering.
#[derive(Debug, Clone, Copy)]
pub struct NumberKey(f64);

impl NumberKey {
    fn new(value: f64) -> Self {
        // -0.0 and 0.0 are one group.
        Self(if value == 0.0 { 0.0 } else { value })
    }
}

impl PartialEq for NumberKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for NumberKey {}

impl Hash for NumberKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl PartialOrd for NumberKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NumberKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Group identity of a record, or `None` if `group_key` is absent.
///
/// An explicit `null` is a group of its own.
pub fn group_value(record: &Record, group_key: &str) -> Option<GroupKey> {
    record.get(group_key).map(GroupKey::from_value)
}

/// Parse a JSON payload into a record, rejecting non-object documents.
pub fn parse_record(payload: &[u8]) -> Result<Record, RecordParseError> {
    match serde_json::from_slice::<Value>(payload) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(RecordParseError::NotAnObject),
        Err(e) => Err(RecordParseError::Json(e.to_string())),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordParseError {
    NotAnObject,
    Json(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("test record must be an object"),
        }
    }

    #[test]
    fn test_stamp_overwrites_producer_timestamp() {
        let mut rec = record(json!({"value": 1, "timestamp": "bogus"}));
        stamp(&mut rec, DateTime::<Utc>::UNIX_EPOCH + chrono::Duration::milliseconds(1500));
        assert_eq!(rec.get(TIMESTAMP_FIELD), Some(&json!(1.5)));
        assert_eq!(rec.get("value"), Some(&json!(1)));
    }

    #[test]
    fn test_group_value_keeps_json_type() {
        let rec = record(json!({"node": "a", "id": 3, "sid": "3", "gone": null}));
        assert_eq!(group_value(&rec, "node"), Some(GroupKey::String("a".to_string())));
        assert_ne!(group_value(&rec, "id"), group_value(&rec, "sid"));
        assert_eq!(group_value(&rec, "gone"), Some(GroupKey::Null));
        assert_eq!(group_value(&rec, "missing"), None);
    }

    #[test]
    fn test_numeric_group_keys_compare_by_value() {
        let int = GroupKey::from_value(&json!(1));
        assert_eq!(int, GroupKey::from_value(&json!(1.0)));
        assert_eq!(GroupKey::from_value(&json!(-0.0)), GroupKey::from_value(&json!(0)));
        assert!(GroupKey::from_value(&json!(2)) < GroupKey::from_value(&json!(10)));
        assert!(int < GroupKey::from_value(&json!("0")));
        assert_eq!(GroupKey::from_value(&json!("johnny01")).to_string(), "johnny01");
    }

    #[test]
    fn test_parse_record() {
        assert!(parse_record(br#"{"cpu": 0.5}"#).is_ok());
        assert_eq!(parse_record(b"[1, 2]"), Err(RecordParseError::NotAnObject));
        assert!(matches!(parse_record(b"{oops"), Err(RecordParseError::Json(_))));
    }
}
