//! Mapping form of a [`Record`], used to rehydrate records from
//! deserialized data and to write them back out.
//!
//! The mapping carries `name`, `level`, `timestamp` (epoch milliseconds, or
//! an RFC 3339 string on input), `msg` and `args` (`null` once the message
//! is resolved). Any other key is an extra attribute and lands in
//! [`Record::fields`].

use crate::arg::Arg;
use crate::error::RecordError;
use crate::record::{Message, Record};
use chrono::serde::ts_milliseconds;
use chrono::{DateTime, Utc};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

pub const NAME_KEY: &str = "name";
pub const LEVEL_KEY: &str = "level";
pub const TIMESTAMP_KEY: &str = "timestamp";
pub const MSG_KEY: &str = "msg";
pub const ARGS_KEY: &str = "args";

const RESERVED_KEYS: [&str; 5] = [NAME_KEY, LEVEL_KEY, TIMESTAMP_KEY, MSG_KEY, ARGS_KEY];

impl Record {
    /// Build a record by copying every entry of `map`.
    ///
    /// `name`, `level` and `timestamp` are required. `msg` defaults to an
    /// empty string. An `args` array yields an unresolved message; a
    /// missing or `null` `args` yields a resolved one.
    pub fn from_fields(mut map: Map<String, Value>) -> Result<Self, RecordError> {
        let name = match map.remove(NAME_KEY) {
            Some(Value::String(name)) => name,
            Some(_) => return Err(invalid(NAME_KEY, "a string")),
            None => return Err(RecordError::MissingField(NAME_KEY)),
        };

        let level = map
            .remove(LEVEL_KEY)
            .ok_or(RecordError::MissingField(LEVEL_KEY))?
            .as_i64()
            .and_then(|level| i32::try_from(level).ok())
            .ok_or_else(|| invalid(LEVEL_KEY, "a 32-bit integer"))?;

        let timestamp = map
            .remove(TIMESTAMP_KEY)
            .ok_or(RecordError::MissingField(TIMESTAMP_KEY))
            .and_then(|value| parse_timestamp(&value))?;

        let msg = match map.remove(MSG_KEY) {
            Some(Value::String(msg)) => msg,
            Some(Value::Null) | None => String::new(),
            Some(_) => return Err(invalid(MSG_KEY, "a string")),
        };

        let message = match map.remove(ARGS_KEY) {
            Some(Value::Array(args)) => Message::Unresolved {
                template: msg,
                args: args.into_iter().map(Arg::from_serialized).collect(),
            },
            Some(Value::Null) | None => Message::Resolved(msg),
            Some(_) => return Err(invalid(ARGS_KEY, "an array or null")),
        };

        if !map.is_empty() {
            tracing::debug!(record = %name, extra = map.len(), "copying extra record attributes");
        }

        Ok(Record {
            name,
            level,
            timestamp,
            message,
            fields: map.into_iter().collect(),
        })
    }

    /// The mapping form of this record.
    pub fn to_value(&self) -> Result<Value, RecordError> {
        Ok(serde_json::to_value(self)?)
    }
}

fn invalid(field: &'static str, expected: &'static str) -> RecordError {
    RecordError::InvalidField { field, expected }
}

fn parse_timestamp(value: &Value) -> Result<DateTime<Utc>, RecordError> {
    match value {
        Value::Number(n) => ts_milliseconds::deserialize(value)
            .ok()
            .or_else(|| n.as_f64().and_then(|ms| DateTime::<Utc>::from_timestamp_millis(ms as i64)))
            .ok_or_else(|| RecordError::InvalidTimestamp(n.to_string())),
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|e| RecordError::InvalidTimestamp(format!("{}: {}", s, e))),
        _ => Err(invalid(TIMESTAMP_KEY, "epoch milliseconds or an RFC 3339 string")),
    }
}

struct EpochMillis<'a>(&'a DateTime<Utc>);

impl Serialize for EpochMillis<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ts_milliseconds::serialize(self.0, serializer)
    }
}

impl TryFrom<Value> for Record {
    type Error = RecordError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Record::from_fields(map),
            _ => Err(RecordError::NotAnObject),
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let extra = self
            .fields
            .iter()
            .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()));

        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry(NAME_KEY, &self.name)?;
        map.serialize_entry(LEVEL_KEY, &self.level)?;
        map.serialize_entry(TIMESTAMP_KEY, &EpochMillis(&self.timestamp))?;
        match &self.message {
            Message::Unresolved { template, args } => {
                map.serialize_entry(MSG_KEY, template)?;
                map.serialize_entry(ARGS_KEY, args)?;
            }
            Message::Resolved(text) => {
                map.serialize_entry(MSG_KEY, text)?;
                map.serialize_entry(ARGS_KEY, &Value::Null)?;
            }
        }
        for (key, value) in extra {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        Record::from_fields(map).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::level;
    use chrono::TimeZone;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "name": "svc.http",
            "level": 40,
            "timestamp": 1_709_820_309_007_i64,
            "msg": "slow request to %s took %dms",
            "args": ["/health", 1500],
            "request_id": "abc-123",
            "attempt": 2
        })
    }

    #[test]
    fn test_from_fields_copies_every_field() {
        let source = sample();
        let mut record = Record::try_from(source.clone()).unwrap();

        assert_eq!(record.name, source["name"]);
        assert_eq!(i64::from(record.level), source["level"].as_i64().unwrap());
        assert_eq!(record.timestamp.timestamp_millis(), source["timestamp"].as_i64().unwrap());
        assert_eq!(record.raw_message().as_str(), source["msg"]);
        assert_eq!(record.field("request_id"), Some(&source["request_id"]));
        assert_eq!(record.field("attempt"), Some(&source["attempt"]));
        assert_eq!(
            record.raw_message(),
            &Message::Unresolved {
                template: "slow request to %s took %dms".to_string(),
                args: args!["/health", 1500],
            }
        );
        assert_eq!(record.message(), "slow request to /health took 1500ms");
    }

    #[test]
    fn test_error_args_keep_their_rendering() {
        use crate::arg::CapturedError;

        let ts = Utc.with_ymd_and_hms(2024, 3, 7, 14, 5, 9).unwrap();
        let err = CapturedError::new("Error", "boom").with_stack("Error: boom\n    at a\n    at b");
        let original = Record::new("svc", level::ERROR, ts, "failed: %s", vec![Arg::from(err)]);

        let mut restored = Record::try_from(original.to_value().unwrap()).unwrap();
        assert_eq!(restored, original);
        assert_eq!(restored.message(), "failed: Error: boom");
    }

    #[test]
    fn test_float_timestamp_is_accepted() {
        let record = Record::try_from(json!({"name": "svc", "level": 30, "timestamp": 1500.0})).unwrap();
        assert_eq!(record.timestamp.timestamp_millis(), 1500);
    }

    #[test]
    fn test_null_args_start_resolved() {
        let record = Record::try_from(json!({
            "name": "svc",
            "level": 30,
            "timestamp": 0,
            "msg": "ready %s",
            "args": null
        }))
        .unwrap();
        assert!(record.is_resolved());
        assert_eq!(record.raw_message().as_str(), "ready %s");
    }

    #[test]
    fn test_rfc3339_timestamp() {
        let record = Record::try_from(json!({
            "name": "svc",
            "level": 30,
            "timestamp": "2024-03-07T14:05:09.007Z"
        }))
        .unwrap();
        assert_eq!(record.time_in(&Utc), "14:05:09.007");
        assert_eq!(record.raw_message().as_str(), "");
    }

    #[test]
    fn test_missing_name_is_rejected() {
        let err = Record::try_from(json!({"level": 30, "timestamp": 0})).unwrap_err();
        assert!(matches!(err, RecordError::MissingField("name")));
    }

    #[test]
    fn test_non_integer_level_is_rejected() {
        let err = Record::try_from(json!({"name": "svc", "level": "info", "timestamp": 0})).unwrap_err();
        assert!(matches!(err, RecordError::InvalidField { field: "level", .. }));
    }

    #[test]
    fn test_bad_timestamp_is_rejected() {
        let err = Record::try_from(json!({"name": "svc", "level": 30, "timestamp": "yesterday"})).unwrap_err();
        assert!(matches!(err, RecordError::InvalidTimestamp(_)));
    }

    #[test]
    fn test_non_object_is_rejected() {
        assert!(matches!(Record::try_from(json!([1, 2])), Err(RecordError::NotAnObject)));
    }

    #[test]
    fn test_serialize_writes_mapping_form() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 7, 14, 5, 9).unwrap();
        let mut record = Record::new("svc", level::INFO, ts, "hello %s", args!["world"]);
        record.insert_field("region", "eu-west-1");
        record.insert_field("msg", "shadowed");

        assert_eq!(
            record.to_value().unwrap(),
            json!({
                "name": "svc",
                "level": 30,
                "timestamp": ts.timestamp_millis(),
                "msg": "hello %s",
                "args": ["world"],
                "region": "eu-west-1"
            })
        );

        record.message();
        let value = record.to_value().unwrap();
        assert_eq!(value["msg"], "hello world");
        assert_eq!(value["args"], Value::Null);
    }

    #[test]
    fn test_deserialize_from_json_text() {
        let text = r#"{"name":"svc","level":50,"timestamp":1000,"msg":"%s failed","args":["job"]}"#;
        let mut record: Record = serde_json::from_str(text).unwrap();
        assert_eq!(record.level, level::ERROR);
        assert_eq!(record.message(), "job failed");

        let err = serde_json::from_str::<Record>(r#"{"level":50,"timestamp":1000}"#).unwrap_err();
        assert!(err.to_string().contains("missing required field `name`"));
    }
}
