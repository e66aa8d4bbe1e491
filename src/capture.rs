use crate::arg::{CapturedError, Fault};
use crate::level;
use crate::record::Record;
use chrono::Utc;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::field::{Field, Visit};
use tracing::Event;

impl Record {
    /// Capture a `tracing` event as a record.
    ///
    /// The event target becomes the record name and its level is mapped to
    /// the standard codes. The `message` field becomes the (already resolved)
    /// message; every other field is kept in [`Record::fields`].
    pub fn from_event(event: &Event<'_>) -> Self {
        let mut fields = BTreeMap::new();
        let mut message: Option<String> = None;

        let mut visitor = FieldVisitor {
            fields: &mut fields,
            message: &mut message,
        };
        event.record(&mut visitor);

        let meta = event.metadata();
        let mut record = Record::with_message(
            meta.target(),
            level::code_for(meta.level()),
            Utc::now(),
            message.unwrap_or_default(),
        );
        record.fields = fields;
        record
    }
}

/// Collects the fields of a `tracing` event into JSON values, splitting off
/// the `message` field.
pub struct FieldVisitor<'a> {
    pub fields: &'a mut BTreeMap<String, Value>,
    pub message: &'a mut Option<String>,
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.fields.insert(field.name().to_string(), Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        let captured = CapturedError::capture(value);
        let mut entry = serde_json::Map::new();
        entry.insert("error".to_string(), Value::String(captured.description()));
        entry.insert("stack".to_string(), captured.stack().map(Value::String).unwrap_or(Value::Null));
        self.fields.insert(field.name().to_string(), Value::Object(entry));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        // `message` arrives as `fmt::Arguments`, whose Debug output is the text itself.
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.fields.insert(field.name().to_string(), Value::String(format!("{:?}", value)));
        }
    }
}
