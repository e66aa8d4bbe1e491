use crate::arg::Arg;
use crate::format;
use crate::level::LevelTable;
use chrono::{DateTime, Local, TimeZone, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

const TIME_FORMAT: &str = "%H:%M:%S%.3f";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Message of a [`Record`]: a template still waiting for its arguments, or
/// the final text.
///
/// The only transition is `Unresolved` → `Resolved`, performed by
/// [`Record::message`].
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Unresolved { template: String, args: Vec<Arg> },
    Resolved(String),
}

impl Message {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Message::Resolved(_))
    }

    /// Resolved text, or the raw template if the message is not resolved yet.
    pub fn as_str(&self) -> &str {
        match self {
            Message::Unresolved { template, .. } => template,
            Message::Resolved(text) => text,
        }
    }

    fn resolve(&mut self) -> &str {
        if let Message::Unresolved { template, args } = self {
            *self = Message::Resolved(format::interpolate(template, args));
        }
        self.as_str()
    }
}

/// One captured log event.
///
/// Records carry the `name` of their origin, an integer `level`, a
/// `timestamp` and a message that may be formatted lazily from a template
/// and arguments. Processors may attach additional attributes through
/// [`Record::insert_field`].
///
/// Apart from the one-time message resolution a record is not modified
/// by any of its accessors. None of them fail.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub name: String,
    pub level: i32,
    pub timestamp: DateTime<Utc>,
    pub(crate) message: Message,
    pub fields: BTreeMap<String, Value>,
}

impl Record {
    /// Record with a message template to be combined with `args` on first
    /// access.
    pub fn new(
        name: impl Into<String>,
        level: i32,
        timestamp: DateTime<Utc>,
        template: impl Into<String>,
        args: Vec<Arg>,
    ) -> Self {
        Record {
            name: name.into(),
            level,
            timestamp,
            message: Message::Unresolved {
                template: template.into(),
                args,
            },
            fields: BTreeMap::new(),
        }
    }

    /// Record whose message is already final.
    pub fn with_message(
        name: impl Into<String>,
        level: i32,
        timestamp: DateTime<Utc>,
        message: impl Into<String>,
    ) -> Self {
        Record {
            name: name.into(),
            level,
            timestamp,
            message: Message::Resolved(message.into()),
            fields: BTreeMap::new(),
        }
    }

    /// [`Record::new`] stamped with the current time.
    pub fn now(name: impl Into<String>, level: i32, template: impl Into<String>, args: Vec<Arg>) -> Self {
        Self::new(name, level, Utc::now(), template, args)
    }

    /// Symbolic name of the record's level, `None` if `levels` does not
    /// know the code.
    pub fn level_name<'t>(&self, levels: &'t LevelTable) -> Option<&'t str> {
        levels.name(self.level)
    }

    /// Local time of day, `HH:MM:SS.mmm`.
    pub fn time(&self) -> String {
        self.time_in(&Local)
    }

    /// Local date, `YYYY-MM-DD`.
    pub fn date(&self) -> String {
        self.date_in(&Local)
    }

    pub fn time_in<Tz>(&self, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        self.timestamp.with_timezone(tz).format(TIME_FORMAT).to_string()
    }

    pub fn date_in<Tz>(&self, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        self.timestamp.with_timezone(tz).format(DATE_FORMAT).to_string()
    }

    /// The formatted message.
    ///
    /// The first call combines the template with the arguments and caches
    /// the result in place of both; later calls return the cached text
    /// without formatting again. Error arguments with a stack trace render
    /// their description under `%s` and their full stack under `%o`/`%j`
    /// or when appended as extra arguments.
    pub fn message(&mut self) -> &str {
        self.message.resolve()
    }

    pub fn into_message(mut self) -> String {
        self.message.resolve();
        match self.message {
            Message::Resolved(text) => text,
            Message::Unresolved { template, .. } => template,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.message.is_resolved()
    }

    pub fn raw_message(&self) -> &Message {
        &self.message
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Attach an attribute. Keys used by the mapping form (`name`, `level`,
    /// `timestamp`, `msg`, `args`) are not written out on serialization.
    pub fn insert_field(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(key.into(), value.into())
    }
}
