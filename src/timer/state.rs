use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TimerStatus {
    Idle,
    Running,
}

impl Default for TimerStatus {
    fn default() -> Self {
        TimerStatus::Idle
    }
}

/// What a single tick changed on a running segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    pub elapsed_ms: u64,
    /// True only on the tick that first latched `is_over`.
    pub crossed_over: bool,
}

/// Runtime state of one segment.
///
/// `start_time` doubles as the checkpoint: each tick folds the time since the
/// checkpoint into `elapsed_ms` and moves the checkpoint forward, so paused
/// intervals are never counted and error never exceeds one tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SegmentTimer {
    pub start_time: Option<i64>,
    pub elapsed_ms: u64,
    pub is_over: bool,
}

fn interval_ms(from: i64, to: i64) -> u64 {
    // A clock stepping backwards contributes nothing.
    u64::try_from(to.saturating_sub(from)).unwrap_or(0)
}

impl SegmentTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> TimerStatus {
        if self.start_time.is_some() {
            TimerStatus::Running
        } else {
            TimerStatus::Idle
        }
    }

    pub fn is_running(&self) -> bool {
        self.start_time.is_some()
    }

    /// Returns false when the segment was already running.
    pub fn start(&mut self, now: i64) -> bool {
        if self.is_running() {
            return false;
        }
        self.start_time = Some(now);
        true
    }

    /// Folds the open interval and goes idle. Returns the new accumulated value,
    /// or `None` if the segment was not running.
    pub fn stop(&mut self, now: i64) -> Option<u64> {
        let anchor = self.start_time.take()?;
        self.elapsed_ms = self.elapsed_ms.saturating_add(interval_ms(anchor, now));
        Some(self.elapsed_ms)
    }

    pub fn tick(&mut self, now: i64, duration_ms: u64, allow_negative: bool) -> Option<TickOutcome> {
        let anchor = self.start_time?;
        self.elapsed_ms = self.elapsed_ms.saturating_add(interval_ms(anchor, now));
        self.start_time = Some(now);

        let crossed_over = !allow_negative && !self.is_over && self.elapsed_ms >= duration_ms;
        if crossed_over {
            self.is_over = true;
        }

        Some(TickOutcome {
            elapsed_ms: self.elapsed_ms,
            crossed_over,
        })
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn hydrate(&mut self, elapsed_ms: u64, duration_ms: u64, allow_negative: bool) {
        self.elapsed_ms = elapsed_ms;
        self.is_over = !allow_negative && elapsed_ms >= duration_ms;
    }

    /// Accumulated time including the still-open interval, without mutating.
    pub fn current_elapsed_ms(&self, now: i64) -> u64 {
        match self.start_time {
            Some(anchor) => self.elapsed_ms.saturating_add(interval_ms(anchor, now)),
            None => self.elapsed_ms,
        }
    }

    /// Negative once past the duration. Saturates at the `i64` bounds.
    pub fn remaining_ms(&self, duration_ms: u64) -> i64 {
        let remaining = i128::from(duration_ms) - i128::from(self.elapsed_ms);
        i64::try_from(remaining).unwrap_or(if remaining < 0 { i64::MIN } else { i64::MAX })
    }
}
