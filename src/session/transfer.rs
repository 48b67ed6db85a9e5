use serde_json::Value;

use crate::{
    error::{DebateError, DebateResult},
    models::{file_name_component, require_fields, DebateSession, ExportFile, MAX_TIME_MS},
};

/// `debate-<round>-<id>.json`
pub fn session_file_name(session: &DebateSession) -> String {
    format!(
        "debate-{}-{}.json",
        file_name_component(&session.round, "round"),
        file_name_component(&session.id, "session")
    )
}

pub fn export_session(session: &DebateSession) -> DebateResult<ExportFile> {
    Ok(ExportFile {
        file_name: session_file_name(session),
        contents: serde_json::to_string_pretty(session)?,
    })
}

/// Parses a session export. Nothing is applied here, so a failure leaves the
/// caller's state untouched.
pub fn parse_session(raw: &str) -> DebateResult<DebateSession> {
    let value: Value = serde_json::from_str(raw)?;
    require_fields(&value, "session", &["teams", "timers", "auditLog"])?;
    let session: DebateSession = serde_json::from_value(value)
        .map_err(|err| DebateError::validation(format!("session has the wrong shape: {err}")))?;

    if let Some(timer) = session
        .timers
        .iter()
        .find(|timer| timer.current_time > MAX_TIME_MS)
    {
        return Err(DebateError::validation(format!(
            "timer '{}' has an out-of-range time {}",
            timer.id, timer.current_time
        )));
    }
    Ok(session)
}
