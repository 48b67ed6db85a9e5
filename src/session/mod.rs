//! Capturing, storing and moving whole rounds.

mod history;
mod transfer;

pub use history::{RecentSessions, DEFAULT_HISTORY_CAPACITY, SESSIONS_KEY};
pub use transfer::{export_session, parse_session, session_file_name};

use uuid::Uuid;

use crate::{audit::AuditLog, models::DebateSession, timer::TimerEngine};

/// Unique id that sorts by creation time.
pub fn new_session_id() -> String {
    Uuid::now_v7().to_string()
}

/// Captures the live round. The session keeps the id the round already has.
pub fn snapshot(engine: &TimerEngine, audit: &AuditLog) -> DebateSession {
    audit.export_snapshot(
        engine.context(),
        engine.snapshot_timers(),
        Some(engine.format().name.as_str()),
    )
}
