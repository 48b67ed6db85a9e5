//! One live round: the engine for the selected format, its audit log, and the
//! catalog and history it reads from and saves into.

use std::sync::Arc;

use log::{info, warn};

use crate::{
    audit::{AuditEntryView, AuditLog},
    error::{DebateError, DebateResult},
    formats::FormatCatalog,
    models::{DebateFormat, DebateSession, ExportFile, RoundContext, Teams, TimerEvent},
    session::{self, RecentSessions},
    timer::{Clock, SegmentView, TimerEngine, TimerObserver},
};

pub struct DebateRound {
    engine: TimerEngine,
    audit: AuditLog,
    catalog: FormatCatalog,
    history: RecentSessions,
}

impl DebateRound {
    /// Opens a fresh round on the catalog's default format.
    pub fn new(catalog: FormatCatalog, history: RecentSessions, clock: Arc<dyn Clock>) -> Self {
        let mut engine = TimerEngine::new(catalog.default_format(), clock);
        engine.set_context(RoundContext {
            session_id: session::new_session_id(),
            ..RoundContext::default()
        });

        Self {
            engine,
            audit: AuditLog::new(),
            catalog,
            history,
        }
    }

    pub fn format(&self) -> &DebateFormat {
        self.engine.format()
    }

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    pub fn catalog(&self) -> &FormatCatalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut FormatCatalog {
        &mut self.catalog
    }

    pub fn history(&self) -> &RecentSessions {
        &self.history
    }

    pub fn context(&self) -> &RoundContext {
        self.engine.context()
    }

    pub fn session_id(&self) -> &str {
        &self.engine.context().session_id
    }

    pub fn active_segment(&self) -> Option<&str> {
        self.engine.active_segment()
    }

    pub fn subscribe(&mut self, observer: TimerObserver) {
        self.engine.subscribe(observer);
    }

    pub fn set_round_label(&mut self, label: &str) {
        let mut context = self.engine.context().clone();
        context.round_label = label.trim().to_string();
        self.engine.set_context(context);
    }

    pub fn set_teams(&mut self, affirmative: &str, negative: &str) {
        let mut context = self.engine.context().clone();
        context.teams = Teams {
            affirmative: affirmative.trim().to_string(),
            negative: negative.trim().to_string(),
        };
        self.engine.set_context(context);
    }

    pub fn start(&mut self, id: &str) -> DebateResult<()> {
        let events = self.engine.start(id)?;
        self.audit.extend(events);
        Ok(())
    }

    pub fn stop(&mut self, id: &str) -> DebateResult<()> {
        if let Some(event) = self.engine.stop(id)? {
            self.audit.append(event);
        }
        Ok(())
    }

    pub fn stop_active(&mut self) {
        if let Some(event) = self.engine.stop_active() {
            self.audit.append(event);
        }
    }

    /// Start if idle, stop if it is the running segment.
    pub fn toggle(&mut self, id: &str) -> DebateResult<()> {
        let events = self.engine.toggle(id)?;
        self.audit.extend(events);
        Ok(())
    }

    /// Wipes one segment back to zero. Resets are not audited.
    pub fn reset(&mut self, id: &str) -> DebateResult<()> {
        self.engine.reset(id)
    }

    pub fn reset_all(&mut self) {
        self.engine.reset_all();
    }

    pub fn tick(&mut self) -> Option<TimerEvent> {
        let over = self.engine.tick()?;
        self.audit.append(over.clone());
        Some(over)
    }

    pub fn snapshot(&self) -> DebateSession {
        session::snapshot(&self.engine, &self.audit)
    }

    /// Stops the running segment, saves the round to history and starts a
    /// clean one with a new session id. Labels and team codes carry over.
    /// Nothing changes unless the history write succeeds.
    pub fn new_round(&mut self) -> DebateResult<DebateSession> {
        let now = self.engine.now_ms();
        let mut finished = self.snapshot();
        if let Some(stop) = self.engine.pending_stop(now) {
            if let Some(timer) = finished.timers.iter_mut().find(|t| t.id == stop.timer_id) {
                timer.current_time = stop.elapsed_time;
            }
            finished.audit_log.push(stop);
        }
        self.history.add(finished.clone())?;

        // The stop is already in `finished`; the live log is cleared below.
        self.engine.stop_active_at(now);
        self.engine.reset_all();
        self.audit.clear();
        let mut context = self.engine.context().clone();
        context.session_id = session::new_session_id();
        self.engine.set_context(context);

        info!(
            "Round {} saved; new session {}",
            finished.id,
            self.session_id()
        );
        Ok(finished)
    }

    /// Switches the live round to another format. Timers restart from zero;
    /// the audit log is kept.
    pub fn select_format(&mut self, name: &str) -> DebateResult<()> {
        let format = self
            .catalog
            .get(name)
            .cloned()
            .ok_or_else(|| DebateError::validation(format!("no format named '{name}'")))?;
        self.stop_active();
        self.engine.load_format(&format);
        Ok(())
    }

    pub fn export_session(&self) -> DebateResult<ExportFile> {
        session::export_session(&self.snapshot())
    }

    /// Replaces the live round with an exported session. On error nothing
    /// changes.
    pub fn import_session(&mut self, raw: &str) -> DebateResult<()> {
        let session = session::parse_session(raw)?;
        self.adopt(session);
        Ok(())
    }

    pub fn load_from_history(&mut self, id: &str) -> DebateResult<()> {
        let session = self
            .history
            .get(id)
            .cloned()
            .ok_or_else(|| DebateError::validation(format!("no saved session '{id}'")))?;
        self.adopt(session);
        Ok(())
    }

    pub fn delete_from_history(&mut self, id: &str) -> DebateResult<bool> {
        self.history.delete(id)
    }

    pub fn clear_history(&mut self) -> DebateResult<()> {
        self.history.clear()
    }

    pub fn segment_views(&self) -> Vec<SegmentView> {
        self.engine.views()
    }

    pub fn audit_view(&self) -> Vec<AuditEntryView> {
        self.audit.view()
    }

    fn adopt(&mut self, session: DebateSession) {
        let target = session
            .format
            .as_deref()
            .and_then(|name| match self.catalog.get(name) {
                Some(format) => Some(format.clone()),
                None => {
                    warn!("Session names unknown format '{name}'; keeping current format");
                    None
                }
            });

        match target {
            Some(format) if format.name != self.engine.format().name => {
                self.engine.load_format(&format)
            }
            _ => self.engine.reset_all(),
        }

        for timer in &session.timers {
            if let Err(err) = self.engine.hydrate(&timer.id, timer.current_time) {
                warn!("Skipping saved timer: {err}");
            }
        }

        let session_id = if session.id.is_empty() {
            session::new_session_id()
        } else {
            session.id
        };
        self.engine.set_context(RoundContext {
            round_label: session.round,
            teams: session.teams,
            session_id,
        });
        self.audit = AuditLog::from_events(session.audit_log);

        info!(
            "Loaded session {} ({} events)",
            self.session_id(),
            self.audit.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::TimerEventKind,
        session::DEFAULT_HISTORY_CAPACITY,
        store::{MemoryStore, Persistence},
        timer::ManualClock,
    };

    fn round_with(store: Arc<dyn Persistence>) -> (DebateRound, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let catalog = FormatCatalog::load(store.clone());
        let history = RecentSessions::load(store, DEFAULT_HISTORY_CAPACITY);
        (DebateRound::new(catalog, history, clock.clone()), clock)
    }

    fn round() -> (DebateRound, Arc<ManualClock>) {
        round_with(Arc::new(MemoryStore::new()))
    }

    fn elapsed(round: &DebateRound) -> Vec<(String, u64)> {
        round
            .segment_views()
            .into_iter()
            .map(|view| (view.id, view.elapsed_ms))
            .collect()
    }

    #[test]
    fn opens_on_default_format_with_session_id() {
        let (round, _) = round();
        assert_eq!(round.format().name, "Lincoln-Douglas");
        assert!(!round.session_id().is_empty());
        assert_eq!(round.segment_views().len(), 6);
    }

    #[test]
    fn engine_events_land_in_audit_log_with_context() {
        let (mut round, clock) = round();
        round.set_round_label("Finals");
        round.set_teams("AB", "CD");
        round.start("aff-constructive").unwrap();
        clock.advance(2_000);
        round.start("neg-constructive").unwrap();
        clock.advance(1_000);
        round.stop_active();

        let events = round.audit().events();
        let kinds: Vec<_> = events.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TimerEventKind::Start,
                TimerEventKind::Stop,
                TimerEventKind::Start,
                TimerEventKind::Stop
            ]
        );
        assert!(events.iter().all(|e| e.round_label == "Finals"
            && e.aff_code == "AB"
            && e.session_id == round.session_id()));
    }

    #[test]
    fn toggle_matches_button_behaviour() {
        let (mut round, clock) = round();
        round.toggle("aff-rebuttal").unwrap();
        assert_eq!(round.active_segment(), Some("aff-rebuttal"));
        clock.advance(300);
        round.toggle("aff-rebuttal").unwrap();
        assert_eq!(round.active_segment(), None);
        assert_eq!(round.audit().len(), 2);
    }

    #[test]
    fn quick_test_over_scenario() {
        let (mut round, clock) = round();
        round.select_format("Quick Test").unwrap();
        round.start("aff-test2").unwrap();

        let mut overs = Vec::new();
        while clock.now_ms() < 1_700_000_000_000 + 10_020 {
            clock.advance(10);
            overs.extend(round.tick());
        }
        assert_eq!(overs.len(), 1);
        assert_eq!(overs[0].kind, TimerEventKind::Over);
        assert!((10_000..=10_020).contains(&overs[0].elapsed_time));
        assert_eq!(round.active_segment(), Some("aff-test2"));

        clock.advance(500);
        round.tick();
        round.stop("aff-test2").unwrap();
        let kinds: Vec<_> = round.audit().events().iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![TimerEventKind::Start, TimerEventKind::Over, TimerEventKind::Stop]
        );
    }

    #[test]
    fn new_round_saves_and_resets() {
        let (mut round, clock) = round();
        let first_id = round.session_id().to_string();
        round.start("aff-summary").unwrap();
        clock.advance(1_500);

        let saved = round.new_round().unwrap();
        assert_eq!(saved.id, first_id);
        assert_eq!(saved.elapsed_for("aff-summary"), Some(1_500));
        assert_eq!(saved.audit_log.last().map(|e| e.kind), Some(TimerEventKind::Stop));

        assert_ne!(round.session_id(), first_id);
        assert!(round.audit().is_empty());
        assert!(elapsed(&round).iter().all(|(_, ms)| *ms == 0));
        assert_eq!(round.history().entries()[0].id, first_id);
        assert!(round.history().entries()[0].is_historical);
    }

    #[test]
    fn reset_wipes_without_auditing() {
        let (mut round, clock) = round();
        round.start("neg-rebuttal").unwrap();
        clock.advance(700);
        round.reset("neg-rebuttal").unwrap();
        assert_eq!(round.active_segment(), None);
        assert_eq!(round.audit().len(), 1);
        assert!(elapsed(&round).iter().all(|(_, ms)| *ms == 0));
        assert!(matches!(
            round.reset("cross-ex"),
            Err(DebateError::UnknownSegment(_))
        ));
    }

    struct ReadOnlyStore;

    impl Persistence for ReadOnlyStore {
        fn get(&self, _key: &str) -> anyhow::Result<Option<Vec<u8>>> {
            Ok(None)
        }

        fn set(&self, key: &str, _value: &[u8]) -> anyhow::Result<()> {
            anyhow::bail!("disk full writing {key}")
        }

        fn remove(&self, key: &str) -> anyhow::Result<()> {
            anyhow::bail!("disk full removing {key}")
        }
    }

    #[test]
    fn failed_history_write_leaves_round_running() {
        let (mut round, clock) = round_with(Arc::new(ReadOnlyStore));
        round.start("aff-constructive").unwrap();
        clock.advance(500);
        let session_id = round.session_id().to_string();

        let err = round.new_round().unwrap_err();
        assert!(matches!(err, DebateError::Storage(_)));

        assert_eq!(round.active_segment(), Some("aff-constructive"));
        assert_eq!(round.audit().len(), 1);
        assert_eq!(round.session_id(), session_id);
        assert!(round.history().is_empty());

        clock.advance(250);
        round.stop_active();
        assert_eq!(
            round.engine().timer("aff-constructive").map(|t| t.elapsed_ms),
            Some(750)
        );
    }

    #[test]
    fn unknown_format_selection_is_rejected() {
        let (mut round, _) = round();
        assert!(round.select_format("Worlds").is_err());
        assert_eq!(round.format().name, "Lincoln-Douglas");
    }

    #[test]
    fn export_delete_reimport_restores_state() {
        let (mut round, clock) = round();
        let seed = r#"{"id":"S1","round":"Quarters","format":"Public Forum",
            "teams":{"affirmative":"AB","negative":"CD"},"timers":[],"auditLog":[]}"#;
        round.import_session(seed).unwrap();
        assert_eq!(round.session_id(), "S1");
        assert_eq!(round.format().name, "Public Forum");

        round.start("aff-speaker1").unwrap();
        clock.advance(61_230);
        round.stop("aff-speaker1").unwrap();
        assert_eq!(round.audit().len(), 2);

        let before_elapsed = elapsed(&round);
        let before_context = round.context().clone();
        let before_log = round.audit().clone();
        let file = round.export_session().unwrap();
        assert_eq!(file.file_name, "debate-Quarters-S1.json");

        round.new_round().unwrap();
        assert!(round.delete_from_history("S1").unwrap());
        assert!(round.history().get("S1").is_none());

        round.import_session(&file.contents).unwrap();
        assert_eq!(elapsed(&round), before_elapsed);
        assert_eq!(round.context(), &before_context);
        assert_eq!(round.audit(), &before_log);
    }

    #[test]
    fn failed_import_changes_nothing() {
        let (mut round, clock) = round();
        round.set_round_label("R1");
        round.start("aff-constructive").unwrap();
        clock.advance(900);
        round.stop_active();
        let before = round.snapshot();

        assert!(round.import_session("{").is_err());
        assert!(round.import_session(r#"{"teams":{},"timers":[]}"#).is_err());
        assert_eq!(round.snapshot(), before);
    }

    #[test]
    fn import_hydrates_over_and_ignores_unknown_timers() {
        let (mut round, _) = round();
        let raw = r#"{"id":"X","round":"R","teams":{"affirmative":"","negative":""},
            "timers":[{"id":"aff-rebuttal","name":"","currentTime":200000},
                      {"id":"cross-ex","name":"","currentTime":5}],
            "auditLog":[]}"#;
        round.import_session(raw).unwrap();
        let view = round
            .segment_views()
            .into_iter()
            .find(|view| view.id == "aff-rebuttal")
            .unwrap();
        assert!(view.is_over);
        assert_eq!(view.display, "-0:20.00");
    }

    #[test]
    fn out_of_range_import_is_rejected_and_views_still_render() {
        let (mut round, _) = round();
        round.set_round_label("Keep");
        let raw = r#"{"id":"Big","teams":{},"auditLog":[],
            "timers":[{"id":"aff-rebuttal","currentTime":9223372036854775808}]}"#;
        assert!(matches!(
            round.import_session(raw),
            Err(DebateError::Validation(_))
        ));
        assert_eq!(round.context().round_label, "Keep");
        assert_eq!(round.segment_views().len(), 6);
    }

    #[test]
    fn import_without_id_gets_a_fresh_one() {
        let (mut round, _) = round();
        round
            .import_session(r#"{"teams":{},"timers":[],"auditLog":[]}"#)
            .unwrap();
        assert!(!round.session_id().is_empty());
    }

    #[test]
    fn history_reload_and_clear() {
        let store: Arc<dyn Persistence> = Arc::new(MemoryStore::new());
        let (mut round, clock) = round_with(store.clone());
        round.set_round_label("Doubles");
        round.start("neg-summary").unwrap();
        clock.advance(4_000);
        let saved = round.new_round().unwrap();

        let (mut reopened, _) = round_with(store);
        reopened.load_from_history(&saved.id).unwrap();
        assert_eq!(reopened.context().round_label, "Doubles");
        assert_eq!(
            reopened.engine().timer("neg-summary").map(|t| t.elapsed_ms),
            Some(4_000)
        );

        assert!(reopened.load_from_history("missing").is_err());
        reopened.clear_history().unwrap();
        assert!(reopened.history().is_empty());
    }
}
