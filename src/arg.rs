use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt;
use std::sync::Arc;

/// An error value that can be passed as a format argument.
///
/// Formatting treats faults specially: when a stack trace is available the
/// argument is rendered through a [`TraceProxy`], which shows the short
/// description in plain-text verbs and the full stack in structured ones.
pub trait Fault: fmt::Debug + Send + Sync {
    /// Short description, `Kind: message`.
    fn description(&self) -> String;

    /// Full stack trace, if one was captured.
    fn stack(&self) -> Option<String>;
}

/// Owned snapshot of an error: its kind, message and stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedError {
    kind: String,
    message: String,
    stack: Option<String>,
}

impl CapturedError {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        CapturedError {
            kind: kind.into(),
            message: message.into(),
            stack: None,
        }
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Snapshot `err`.
    ///
    /// The stack starts with the description, lists the `source()` chain,
    /// and ends with a backtrace of the capture site when backtraces are
    /// enabled (`RUST_BACKTRACE` / `RUST_LIB_BACKTRACE`).
    pub fn capture<E>(err: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        let captured = CapturedError::new(short_type_name::<E>(), err.to_string());

        let mut stack = captured.description();
        let mut source = err.source();
        while let Some(cause) = source {
            stack.push_str("\n    caused by: ");
            stack.push_str(&cause.to_string());
            source = cause.source();
        }

        let backtrace = Backtrace::capture();
        if backtrace.status() == BacktraceStatus::Captured {
            stack.push('\n');
            stack.push_str(&backtrace.to_string());
        }

        captured.with_stack(stack)
    }

    /// Inverse of [`Fault::description`]: `Kind: message`, or a bare kind.
    pub fn from_description(description: &str) -> Self {
        match description.split_once(": ") {
            Some((kind, message)) => CapturedError::new(kind, message),
            None => CapturedError::new(description, ""),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Fault for CapturedError {
    fn description(&self) -> String {
        if self.message.is_empty() {
            self.kind.clone()
        } else {
            format!("{}: {}", self.kind, self.message)
        }
    }

    fn stack(&self) -> Option<String> {
        self.stack.clone()
    }
}

fn short_type_name<E: ?Sized>() -> &'static str {
    // `dyn core::error::Error + Send + Sync` names the trait, not its bounds
    let full = std::any::type_name::<E>();
    let path = full.strip_prefix("dyn ").unwrap_or(full);
    let path = path.split(['<', ' ', '+']).next().unwrap_or(path);
    path.rsplit("::").next().unwrap_or(path)
}

/// Display proxy for a fault that carries a stack trace.
///
/// `Display` renders the short description; `Debug` renders the stack.
pub struct TraceProxy<'a> {
    fault: &'a dyn Fault,
    stack: String,
}

impl<'a> TraceProxy<'a> {
    /// `None` when the fault has no stack; such faults are formatted as-is.
    pub fn new(fault: &'a dyn Fault) -> Option<Self> {
        fault.stack().map(|stack| TraceProxy { fault, stack })
    }
}

impl fmt::Display for TraceProxy<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fault.description())
    }
}

impl fmt::Debug for TraceProxy<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.stack)
    }
}

/// One format argument of a record message.
#[derive(Debug, Clone)]
pub enum Arg {
    Value(Value),
    Error(Arc<dyn Fault>),
}

impl Arg {
    /// Capture `err` as an error argument.
    pub fn error<E>(err: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        Arg::Error(Arc::new(CapturedError::capture(err)))
    }

    pub fn fault(fault: Arc<dyn Fault>) -> Self {
        Arg::Error(fault)
    }

    /// Rebuild an argument from its serialized form.
    ///
    /// An object holding exactly `error` (a description) and `stack` (a
    /// string or null), as written by [`Serialize`], comes back as an error
    /// argument. Anything else stays a plain value.
    pub fn from_serialized(value: Value) -> Self {
        match captured_from_value(&value) {
            Some(captured) => Arg::from(captured),
            None => Arg::Value(value),
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Arg::Value(value) => Some(value),
            Arg::Error(_) => None,
        }
    }
}

impl PartialEq for Arg {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Arg::Value(a), Arg::Value(b)) => a == b,
            (Arg::Error(a), Arg::Error(b)) => {
                Arc::ptr_eq(a, b) || (a.description() == b.description() && a.stack() == b.stack())
            }
            _ => false,
        }
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Arg::Value(value)
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Arg::Value(Value::String(value.to_string()))
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Arg::Value(Value::String(value))
    }
}

impl From<CapturedError> for Arg {
    fn from(value: CapturedError) -> Self {
        Arg::Error(Arc::new(value))
    }
}

macro_rules! arg_from_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Arg {
                fn from(value: $ty) -> Self {
                    Arg::Value(Value::from(value))
                }
            }
        )*
    };
}

arg_from_value!(bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl Serialize for Arg {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Arg::Value(value) => value.serialize(serializer),
            Arg::Error(fault) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("error", &fault.description())?;
                map.serialize_entry("stack", &fault.stack())?;
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Arg {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Arg::from_serialized)
    }
}

fn captured_from_value(value: &Value) -> Option<CapturedError> {
    let map = value.as_object().filter(|map| map.len() == 2)?;
    let description = map.get("error")?.as_str()?;
    let captured = CapturedError::from_description(description);
    match map.get("stack")? {
        Value::String(stack) => Some(captured.with_stack(stack.as_str())),
        Value::Null => Some(captured),
        _ => None,
    }
}

/// Build a `Vec<Arg>` from anything convertible into [`Arg`].
///
/// ```
/// use tracing_log_record::args;
///
/// let args = args!["world", 42, true];
/// assert_eq!(args.len(), 3);
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::arg::Arg>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::arg::Arg::from($arg)),+]
    };
}
