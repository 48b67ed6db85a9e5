//! Append-only record of timer transitions for the current round.

use chrono::{Local, TimeZone};
use serde::Serialize;

use crate::{
    models::{DebateSession, RoundContext, SegmentSnapshot, TimerEvent},
    timer::display::format_clock,
};

/// One row of the audit history view.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntryView {
    pub label: String,
    pub timer_id: String,
    pub side: String,
    pub elapsed: String,
    pub timestamp: String,
    pub aff_code: String,
    pub neg_code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditLog {
    events: Vec<TimerEvent>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a log from a loaded session, preserving order.
    pub fn from_events(events: Vec<TimerEvent>) -> Self {
        Self { events }
    }

    pub fn append(&mut self, event: TimerEvent) {
        self.events.push(event);
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = TimerEvent>) {
        self.events.extend(events);
    }

    pub fn events(&self) -> &[TimerEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Only called when a brand-new round begins.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn export_snapshot(
        &self,
        context: &RoundContext,
        timers: Vec<SegmentSnapshot>,
        format_name: Option<&str>,
    ) -> DebateSession {
        DebateSession {
            id: context.session_id.clone(),
            round: context.round_label.clone(),
            format: format_name.map(str::to_string),
            teams: context.teams.clone(),
            timers,
            audit_log: self.events.clone(),
            is_historical: false,
        }
    }

    pub fn view(&self) -> Vec<AuditEntryView> {
        self.events
            .iter()
            .map(|event| AuditEntryView {
                label: event.kind.as_str().to_uppercase(),
                timer_id: event.timer_id.clone(),
                side: event.side.as_str().to_string(),
                elapsed: format_clock(event.elapsed_time),
                timestamp: format_timestamp(event.timestamp),
                aff_code: event.aff_code.clone(),
                neg_code: event.neg_code.clone(),
            })
            .collect()
    }
}

/// `MMM d, yyyy HH:mm:ss.SSS` in local time.
pub fn format_timestamp(timestamp_ms: i64) -> String {
    match Local.timestamp_millis_opt(timestamp_ms).single() {
        Some(at) => at.format("%b %-d, %Y %H:%M:%S%.3f").to_string(),
        None => timestamp_ms.to_string(),
    }
}
