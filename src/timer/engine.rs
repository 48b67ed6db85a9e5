use std::sync::Arc;

use log::{debug, warn};
use serde::Serialize;

use crate::{
    error::{DebateError, DebateResult},
    models::{
        DebateFormat, RoundContext, SegmentDefinition, SegmentSnapshot, Side, TimerEvent,
        TimerEventKind,
    },
};

use super::{
    arbiter::ExclusivityArbiter,
    clock::Clock,
    display::format_remaining,
    state::{SegmentTimer, TimerStatus},
};

/// Pushed synchronously to every observer on each state mutation.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TimerNotification {
    Event(TimerEvent),
    #[serde(rename_all = "camelCase")]
    Tick {
        timer_id: String,
        elapsed_ms: u64,
        remaining_ms: i64,
        is_over: bool,
    },
    #[serde(rename_all = "camelCase")]
    Reset { timer_id: String },
    #[serde(rename_all = "camelCase")]
    Hydrated { timer_id: String, elapsed_ms: u64 },
}

pub type TimerObserver = Box<dyn FnMut(&TimerNotification) + Send>;

/// Display row for one segment.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SegmentView {
    pub id: String,
    pub name: String,
    pub side: Side,
    pub duration: u64,
    pub elapsed_ms: u64,
    pub remaining_ms: i64,
    pub display: String,
    pub status: TimerStatus,
    pub is_over: bool,
}

struct SegmentSlot {
    side: Side,
    definition: SegmentDefinition,
    timer: SegmentTimer,
}

/// Timing state for every segment of one format.
pub struct TimerEngine {
    format: DebateFormat,
    slots: Vec<SegmentSlot>,
    arbiter: ExclusivityArbiter,
    clock: Arc<dyn Clock>,
    context: RoundContext,
    observers: Vec<TimerObserver>,
}

fn build_slots(format: &DebateFormat) -> Vec<SegmentSlot> {
    format
        .segments()
        .map(|(side, definition)| SegmentSlot {
            side,
            definition: definition.clone(),
            timer: SegmentTimer::new(),
        })
        .collect()
}

impl TimerEngine {
    pub fn new(format: &DebateFormat, clock: Arc<dyn Clock>) -> Self {
        Self {
            format: format.clone(),
            slots: build_slots(format),
            arbiter: ExclusivityArbiter::new(),
            clock,
            context: RoundContext::default(),
            observers: Vec::new(),
        }
    }

    /// Swaps in a new segment list. All timers start from zero; observers and
    /// round context are kept.
    pub fn load_format(&mut self, format: &DebateFormat) {
        self.reset_all();
        self.format = format.clone();
        self.slots = build_slots(format);
        debug!(
            "engine loaded format '{}' with {} segments",
            format.name,
            self.slots.len()
        );
    }

    pub fn format(&self) -> &DebateFormat {
        &self.format
    }

    pub fn context(&self) -> &RoundContext {
        &self.context
    }

    pub fn set_context(&mut self, context: RoundContext) {
        self.context = context;
    }

    pub fn subscribe(&mut self, observer: TimerObserver) {
        self.observers.push(observer);
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    pub fn active_segment(&self) -> Option<&str> {
        self.arbiter.active()
    }

    pub fn timer(&self, id: &str) -> Option<&SegmentTimer> {
        self.slots
            .iter()
            .find(|slot| slot.definition.id == id)
            .map(|slot| &slot.timer)
    }

    pub fn running_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.timer.is_running()).count()
    }

    /// Starts `id`, stopping whichever segment was running first.
    ///
    /// Returns the audit events in emission order: the previous segment's
    /// `stop` (if any) followed by this segment's `start`. Starting the segment
    /// that is already running returns no events.
    pub fn start(&mut self, id: &str) -> DebateResult<Vec<TimerEvent>> {
        self.index_of(id)?;

        let handoff = self.arbiter.request_start(id);
        let mut events = Vec::with_capacity(2);

        let now = self.clock.now_ms();
        if let Some(previous) = handoff.stop {
            let index = self.index_of(&previous)?;
            events.extend(self.stop_slot(index, now));
        }

        if let Some(next) = handoff.start {
            let index = self.index_of(&next)?;
            let slot = &mut self.slots[index];
            if slot.timer.start(now) {
                let elapsed = slot.timer.elapsed_ms;
                let event = self.event(index, TimerEventKind::Start, elapsed, now);
                self.notify(TimerNotification::Event(event.clone()));
                events.push(event);
            }
        }

        Ok(events)
    }

    /// Stops `id` if it is running.
    pub fn stop(&mut self, id: &str) -> DebateResult<Option<TimerEvent>> {
        let index = self.index_of(id)?;
        if !self.arbiter.release(id) {
            return Ok(None);
        }
        let now = self.clock.now_ms();
        Ok(self.stop_slot(index, now))
    }

    /// Stops the running segment, whichever it is.
    pub fn stop_active(&mut self) -> Option<TimerEvent> {
        let now = self.clock.now_ms();
        self.stop_active_at(now)
    }

    /// The `stop` that [`TimerEngine::stop_active_at`] would emit at `now`,
    /// computed without touching any state.
    pub fn pending_stop(&self, now: i64) -> Option<TimerEvent> {
        let index = self.index_of(self.arbiter.active()?).ok()?;
        let elapsed = self.slots[index].timer.current_elapsed_ms(now);
        Some(self.event(index, TimerEventKind::Stop, elapsed, now))
    }

    pub fn stop_active_at(&mut self, now: i64) -> Option<TimerEvent> {
        let id = self.arbiter.request_stop()?;
        match self.index_of(&id) {
            Ok(index) => self.stop_slot(index, now),
            Err(err) => {
                warn!("active segment vanished from engine: {err}");
                None
            }
        }
    }

    /// Start when idle, stop when it is the running segment.
    pub fn toggle(&mut self, id: &str) -> DebateResult<Vec<TimerEvent>> {
        if self.arbiter.is_active(id) {
            Ok(self.stop(id)?.into_iter().collect())
        } else {
            self.start(id)
        }
    }

    /// Advances the running segment, if any. Returns the `over` event on the
    /// tick that first crosses the segment's duration.
    pub fn tick(&mut self) -> Option<TimerEvent> {
        let id = self.arbiter.active()?.to_string();
        self.tick_segment(&id).ok().flatten()
    }

    pub fn tick_segment(&mut self, id: &str) -> DebateResult<Option<TimerEvent>> {
        let index = self.index_of(id)?;
        let now = self.clock.now_ms();
        let slot = &mut self.slots[index];
        let Some(outcome) = slot.timer.tick(
            now,
            slot.definition.duration_ms(),
            slot.definition.allow_negative,
        ) else {
            return Ok(None);
        };

        let over = if outcome.crossed_over {
            let event = self.event(index, TimerEventKind::Over, outcome.elapsed_ms, now);
            self.notify(TimerNotification::Event(event.clone()));
            Some(event)
        } else {
            None
        };

        let slot = &self.slots[index];
        let notification = TimerNotification::Tick {
            timer_id: slot.definition.id.clone(),
            elapsed_ms: outcome.elapsed_ms,
            remaining_ms: slot.timer.remaining_ms(slot.definition.duration_ms()),
            is_over: slot.timer.is_over,
        };
        self.notify(notification);

        Ok(over)
    }

    /// Wipes one segment back to zero. A running segment is stopped without an
    /// audit entry.
    pub fn reset(&mut self, id: &str) -> DebateResult<()> {
        let index = self.index_of(id)?;
        self.arbiter.release(id);
        self.slots[index].timer.reset();
        self.notify(TimerNotification::Reset {
            timer_id: id.to_string(),
        });
        Ok(())
    }

    pub fn reset_all(&mut self) {
        self.arbiter.request_stop();
        let ids: Vec<String> = self
            .slots
            .iter_mut()
            .map(|slot| {
                slot.timer.reset();
                slot.definition.id.clone()
            })
            .collect();
        for timer_id in ids {
            self.notify(TimerNotification::Reset { timer_id });
        }
    }

    /// Sets accumulated time from a loaded session. Not audited.
    pub fn hydrate(&mut self, id: &str, elapsed_ms: u64) -> DebateResult<()> {
        let index = self.index_of(id)?;
        let slot = &mut self.slots[index];
        slot.timer.hydrate(
            elapsed_ms,
            slot.definition.duration_ms(),
            slot.definition.allow_negative,
        );
        self.notify(TimerNotification::Hydrated {
            timer_id: id.to_string(),
            elapsed_ms,
        });
        Ok(())
    }

    /// Latest stored elapsed value of every segment, in format order.
    pub fn snapshot_timers(&self) -> Vec<SegmentSnapshot> {
        self.slots
            .iter()
            .map(|slot| SegmentSnapshot {
                id: slot.definition.id.clone(),
                name: slot.definition.name.clone(),
                current_time: slot.timer.elapsed_ms,
            })
            .collect()
    }

    pub fn views(&self) -> Vec<SegmentView> {
        self.slots
            .iter()
            .map(|slot| {
                let remaining_ms = slot.timer.remaining_ms(slot.definition.duration_ms());
                SegmentView {
                    id: slot.definition.id.clone(),
                    name: slot.definition.name.clone(),
                    side: slot.side,
                    duration: slot.definition.duration,
                    elapsed_ms: slot.timer.elapsed_ms,
                    remaining_ms,
                    display: format_remaining(remaining_ms),
                    status: slot.timer.status(),
                    is_over: slot.timer.is_over,
                }
            })
            .collect()
    }

    fn index_of(&self, id: &str) -> DebateResult<usize> {
        self.slots
            .iter()
            .position(|slot| slot.definition.id == id)
            .ok_or_else(|| DebateError::UnknownSegment(id.to_string()))
    }

    fn stop_slot(&mut self, index: usize, now: i64) -> Option<TimerEvent> {
        let elapsed = self.slots[index].timer.stop(now)?;
        let event = self.event(index, TimerEventKind::Stop, elapsed, now);
        self.notify(TimerNotification::Event(event.clone()));
        Some(event)
    }

    fn event(&self, index: usize, kind: TimerEventKind, elapsed_ms: u64, now: i64) -> TimerEvent {
        let slot = &self.slots[index];
        TimerEvent {
            timestamp: now,
            kind,
            timer_id: slot.definition.id.clone(),
            side: slot.side,
            elapsed_time: elapsed_ms,
            round_label: self.context.round_label.clone(),
            aff_code: self.context.teams.affirmative.clone(),
            neg_code: self.context.teams.negative.clone(),
            session_id: self.context.session_id.clone(),
        }
    }

    fn notify(&mut self, notification: TimerNotification) {
        for observer in self.observers.iter_mut() {
            observer(&notification);
        }
    }
}
