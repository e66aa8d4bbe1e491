/// Error type returned when rehydrating a [`Record`](crate::record::Record)
/// from its mapping form.
///
/// Formatting and accessors never produce errors; only the construction
/// path that reads untyped, deserialized data can fail.
#[derive(thiserror::Error, Debug)]
pub enum RecordError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("field `{field}` must be {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("expected a JSON object")]
    NotAnObject,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
