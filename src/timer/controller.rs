use std::{sync::Arc, time::Duration};

use serde::Serialize;
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{
    error::DebateResult,
    models::{DebateSession, ExportFile, RoundContext},
    round::DebateRound,
};

use super::{SegmentView, TimerNotification};

// Set to true to trace the ticker lifecycle
const ENABLE_LOGS: bool = false;

use crate::{log_debug, log_info};

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(10);
const UPDATE_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RoundSnapshot {
    pub format: String,
    pub context: RoundContext,
    pub active_segment: Option<String>,
    pub segments: Vec<SegmentView>,
}

struct Ticker {
    handle: JoinHandle<()>,
    cancel: CancellationToken,
}

/// Async front door to a [`DebateRound`].
///
/// Every mutation goes through [`TimerController::with_round`], after which the
/// ticker is started or cancelled to match whether a segment is running.
#[derive(Clone)]
pub struct TimerController {
    round: Arc<Mutex<DebateRound>>,
    ticker: Arc<Mutex<Option<Ticker>>>,
    tick_interval: Duration,
    updates: broadcast::Sender<TimerNotification>,
}

impl TimerController {
    pub fn new(mut round: DebateRound, tick_interval: Duration) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        let sender = updates.clone();
        round.subscribe(Box::new(move |notification| {
            // No receivers is fine; the console may not be listening.
            let _ = sender.send(notification.clone());
        }));

        Self {
            round: Arc::new(Mutex::new(round)),
            ticker: Arc::new(Mutex::new(None)),
            tick_interval,
            updates,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TimerNotification> {
        self.updates.subscribe()
    }

    pub async fn get_snapshot(&self) -> RoundSnapshot {
        let guard = self.round.lock().await;
        RoundSnapshot {
            format: guard.format().name.clone(),
            context: guard.context().clone(),
            active_segment: guard.active_segment().map(str::to_string),
            segments: guard.segment_views(),
        }
    }

    /// Runs `f` against the round, then reconciles the ticker.
    pub async fn with_round<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&mut DebateRound) -> T,
    {
        let result = {
            let mut guard = self.round.lock().await;
            f(&mut guard)
        };
        self.sync_ticker().await;
        result
    }

    pub async fn start_timer(&self, id: &str) -> DebateResult<()> {
        self.with_round(|round| round.start(id)).await
    }

    pub async fn stop_timer(&self) {
        self.with_round(|round| round.stop_active()).await
    }

    pub async fn toggle_timer(&self, id: &str) -> DebateResult<()> {
        self.with_round(|round| round.toggle(id)).await
    }

    pub async fn new_round(&self) -> DebateResult<DebateSession> {
        self.with_round(|round| round.new_round()).await
    }

    pub async fn import_session(&self, raw: &str) -> DebateResult<()> {
        self.with_round(|round| round.import_session(raw)).await
    }

    pub async fn export_session(&self) -> DebateResult<ExportFile> {
        self.with_round(|round| round.export_session()).await
    }

    pub async fn is_ticking(&self) -> bool {
        self.ticker
            .lock()
            .await
            .as_ref()
            .map_or(false, |ticker| !ticker.handle.is_finished())
    }

    /// Stops any running segment (audited) and tears the ticker down.
    pub async fn shutdown(&self) {
        self.stop_timer().await;
        log_info!("timer controller shut down");
    }

    async fn sync_ticker(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        let running = self.round.lock().await.active_segment().is_some();
        let alive = ticker_guard
            .as_ref()
            .map_or(false, |ticker| !ticker.handle.is_finished());

        if running && !alive {
            if ticker_guard.is_some() {
                log::warn!("ticker exited while a segment was running; restarting");
            }
            *ticker_guard = Some(self.spawn_ticker());
        } else if !running {
            if let Some(ticker) = ticker_guard.take() {
                ticker.cancel.cancel();
                if let Err(err) = ticker.handle.await {
                    log::error!("ticker task failed to join: {err}");
                }
            }
        }
    }

    fn spawn_ticker(&self) -> Ticker {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let round = self.round.clone();
        let tick_interval = self.tick_interval;

        let handle = tokio::spawn(async move {
            let mut interval = time::interval(tick_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            log_debug!("ticker started ({}ms)", tick_interval.as_millis());

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let mut guard = round.lock().await;
                        if guard.active_segment().is_none() {
                            break;
                        }
                        if let Some(over) = guard.tick() {
                            log_info!("{} went over at {}ms", over.timer_id, over.elapsed_time);
                        }
                    }
                    _ = token.cancelled() => break,
                }
            }

            log_debug!("ticker stopped");
        });

        Ticker { handle, cancel }
    }
}
