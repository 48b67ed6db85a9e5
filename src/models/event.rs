use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Side {
    Affirmative,
    Negative,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Affirmative => "affirmative",
            Side::Negative => "negative",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TimerEventKind {
    Start,
    Stop,
    Over,
}

impl TimerEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerEventKind::Start => "start",
            TimerEventKind::Stop => "stop",
            TimerEventKind::Over => "over",
        }
    }
}

/// One audited transition of a segment timer.
///
/// Round and team context is copied onto every event so an exported log can be
/// read without the surrounding session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimerEvent {
    /// Wall-clock milliseconds since the Unix epoch.
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub kind: TimerEventKind,
    pub timer_id: String,
    pub side: Side,
    /// Accumulated milliseconds at the moment of the transition.
    pub elapsed_time: u64,
    #[serde(default)]
    pub round_label: String,
    #[serde(default)]
    pub aff_code: String,
    #[serde(default)]
    pub neg_code: String,
    #[serde(default)]
    pub session_id: String,
}
