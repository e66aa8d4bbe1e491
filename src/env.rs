//! Environment variable names used by this crate for convenient
//! configuration at process startup.
//!
//! These are purely helpers; [`LevelTable`] itself stays decoupled from
//! environment access.

use crate::level::LevelTable;

/// Level-name overrides, e.g. `10=TRACE,25=NOTICE,60=FATAL`.
pub const LOG_RECORD_LEVELS_ENV: &str = "LOG_RECORD_LEVELS";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a comma-separated `code=NAME` list. Malformed entries are skipped
/// with a warning.
pub fn parse_levels(spec: &str) -> Vec<(i32, String)> {
    spec.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| {
            let parsed = entry.split_once('=').and_then(|(code, name)| {
                let name = name.trim();
                let code = code.trim().parse::<i32>().ok()?;
                (!name.is_empty()).then(|| (code, name.to_string()))
            });
            if parsed.is_none() {
                tracing::warn!(entry, "skipping malformed level entry");
            }
            parsed
        })
        .collect()
}

impl LevelTable {
    /// The standard table extended with the overrides in
    /// [`LOG_RECORD_LEVELS_ENV`], if set.
    pub fn from_env() -> Self {
        let spec = env_or(LOG_RECORD_LEVELS_ENV, "");
        let overrides = parse_levels(&spec);
        if !overrides.is_empty() {
            tracing::debug!(count = overrides.len(), "applying level overrides from environment");
        }
        LevelTable::standard().extended(overrides)
    }
}
