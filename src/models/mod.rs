//! Wire and domain models shared by the engine, catalog and session store.
//!
//! Everything here serializes with camelCase names so exported files match the
//! JSON shape the browser front-end reads and writes.

mod event;
mod format;
mod session;

pub use event::{Side, TimerEvent, TimerEventKind};
pub use format::{DebateFormat, SegmentDefinition};
pub use session::{DebateSession, RoundContext, SegmentSnapshot, Teams};

use serde::Serialize;
use serde_json::Value;

use crate::error::{DebateError, DebateResult};

/// Largest millisecond value a segment may hold, so remaining time stays
/// representable as a signed offset.
pub const MAX_TIME_MS: u64 = i64::MAX as u64;

/// A file ready to be handed to the user: suggested name plus pretty JSON.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExportFile {
    pub file_name: String,
    pub contents: String,
}

/// Keeps file names portable: anything outside `[A-Za-z0-9._-]` becomes `-`.
pub(crate) fn file_name_component(raw: &str, fallback: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect();
    if cleaned.is_empty() {
        fallback.to_string()
    } else {
        cleaned
    }
}

/// Rejects a document unless it is an object carrying every key in `fields`.
///
/// A key holding `null` counts as missing.
pub(crate) fn require_fields(value: &Value, what: &str, fields: &[&str]) -> DebateResult<()> {
    let object = value
        .as_object()
        .ok_or_else(|| DebateError::validation(format!("{what} must be a JSON object")))?;

    let missing: Vec<&str> = fields
        .iter()
        .copied()
        .filter(|field| object.get(*field).map_or(true, Value::is_null))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(DebateError::validation(format!(
            "{what} is missing {}",
            missing.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn require_fields_lists_every_missing_key() {
        let value = json!({ "teams": {}, "timers": null });
        let err = require_fields(&value, "session", &["teams", "timers", "auditLog"]).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("timers"));
        assert!(message.contains("auditLog"));
        assert!(!message.contains("teams,"));
    }

    #[test]
    fn file_name_component_replaces_separators() {
        assert_eq!(file_name_component("Round 3/Finals", "round"), "Round-3-Finals");
        assert_eq!(file_name_component("  ", "round"), "round");
    }

    #[test]
    fn require_fields_rejects_non_objects() {
        assert!(require_fields(&json!([1, 2]), "format", &["name"]).is_err());
    }
}
