pub mod arg;
pub mod capture;
pub mod env;
pub mod error;
pub mod format;
pub mod level;
pub mod mapping;
pub mod record;

pub use arg::{Arg, CapturedError, Fault, TraceProxy};
pub use error::RecordError;
pub use level::LevelTable;
pub use record::{Message, Record};
