use std::collections::BTreeMap;

pub const TRACE: i32 = 10;
pub const DEBUG: i32 = 20;
pub const INFO: i32 = 30;
pub const WARN: i32 = 40;
pub const ERROR: i32 = 50;
pub const FATAL: i32 = 60;

const STANDARD: [(i32, &str); 6] = [
    (TRACE, "TRACE"),
    (DEBUG, "DEBUG"),
    (INFO, "INFO"),
    (WARN, "WARN"),
    (ERROR, "ERROR"),
    (FATAL, "FATAL"),
];

/// Read-only mapping from integer level codes to their symbolic names.
///
/// A table is built once at startup (usually [`LevelTable::standard`] or
/// [`LevelTable::from_env`]) and passed by reference to whatever needs to
/// render level names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelTable {
    names: BTreeMap<i32, String>,
}

impl LevelTable {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (i32, S)>,
        S: Into<String>,
    {
        LevelTable {
            names: entries.into_iter().map(|(code, name)| (code, name.into())).collect(),
        }
    }

    /// The standard levels: TRACE 10, DEBUG 20, INFO 30, WARN 40,
    /// ERROR 50, FATAL 60.
    pub fn standard() -> Self {
        Self::new(STANDARD)
    }

    /// Symbolic name for `code`, or `None` if the table does not know it.
    pub fn name(&self, code: i32) -> Option<&str> {
        self.names.get(&code).map(String::as_str)
    }

    /// Reverse lookup, case-insensitive.
    pub fn code(&self, name: &str) -> Option<i32> {
        self.names
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(name))
            .map(|(code, _)| *code)
    }

    /// Return a copy of this table with `entries` added. Existing codes are
    /// renamed.
    pub fn extended<I, S>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (i32, S)>,
        S: Into<String>,
    {
        self.names
            .extend(entries.into_iter().map(|(code, name)| (code, name.into())));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, &str)> {
        self.names.iter().map(|(code, name)| (*code, name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for LevelTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Standard level code for a `tracing` level.
pub fn code_for(level: &tracing::Level) -> i32 {
    match *level {
        tracing::Level::TRACE => TRACE,
        tracing::Level::DEBUG => DEBUG,
        tracing::Level::INFO => INFO,
        tracing::Level::WARN => WARN,
        tracing::Level::ERROR => ERROR,
    }
}
