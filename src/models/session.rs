use serde::{Deserialize, Serialize};

use super::TimerEvent;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Teams {
    #[serde(default)]
    pub affirmative: String,
    #[serde(default)]
    pub negative: String,
}

/// Elapsed time of one segment at the moment a session was captured.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SegmentSnapshot {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub current_time: u64,
}

/// A whole round as stored in history and written to export files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DebateSession {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub round: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    pub teams: Teams,
    pub timers: Vec<SegmentSnapshot>,
    pub audit_log: Vec<TimerEvent>,
    #[serde(default)]
    pub is_historical: bool,
}

impl DebateSession {
    pub fn elapsed_for(&self, segment_id: &str) -> Option<u64> {
        self.timers
            .iter()
            .find(|timer| timer.id == segment_id)
            .map(|timer| timer.current_time)
    }
}

/// Round and team labels stamped onto every audit event.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoundContext {
    pub round_label: String,
    pub teams: Teams,
    pub session_id: String,
}
