use std::sync::Arc;

use log::{debug, info, warn};

use crate::{
    error::DebateResult,
    models::DebateSession,
    store::{load_json, save_json, Persistence},
};

pub const SESSIONS_KEY: &str = "debateTimerSessions";
pub const DEFAULT_HISTORY_CAPACITY: usize = 5;

/// Most-recent-first list of finished rounds, bounded by `capacity`.
pub struct RecentSessions {
    entries: Vec<DebateSession>,
    capacity: usize,
    store: Arc<dyn Persistence>,
}

impl RecentSessions {
    /// Loads the persisted list. A missing or unreadable list starts empty.
    pub fn load(store: Arc<dyn Persistence>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut entries: Vec<DebateSession> = match load_json(store.as_ref(), SESSIONS_KEY) {
            Ok(Some(entries)) => entries,
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!("Failed to parse recent sessions, starting fresh: {err:#}");
                Vec::new()
            }
        };
        entries.truncate(capacity);
        debug!("Loaded {} recent sessions", entries.len());

        Self {
            entries,
            capacity,
            store,
        }
    }

    pub fn entries(&self) -> &[DebateSession] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&DebateSession> {
        self.entries.iter().find(|session| session.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Prepends `session`, replacing any older entry with the same id, and
    /// evicts the oldest entries beyond capacity.
    pub fn add(&mut self, mut session: DebateSession) -> DebateResult<()> {
        session.is_historical = true;

        let id = session.id.clone();
        let mut next = Vec::with_capacity(self.capacity);
        next.push(session);
        next.extend(self.entries.iter().filter(|entry| entry.id != id).cloned());
        next.truncate(self.capacity);

        self.persist(next)?;
        info!("Saved session to history ({} stored)", self.entries.len());
        Ok(())
    }

    /// Returns whether anything was removed.
    pub fn delete(&mut self, id: &str) -> DebateResult<bool> {
        if self.get(id).is_none() {
            return Ok(false);
        }
        let next: Vec<DebateSession> = self
            .entries
            .iter()
            .filter(|session| session.id != id)
            .cloned()
            .collect();
        self.persist(next)?;
        Ok(true)
    }

    pub fn clear(&mut self) -> DebateResult<()> {
        self.store.remove(SESSIONS_KEY)?;
        self.entries.clear();
        Ok(())
    }

    fn persist(&mut self, next: Vec<DebateSession>) -> DebateResult<()> {
        save_json(self.store.as_ref(), SESSIONS_KEY, &next)?;
        self.entries = next;
        Ok(())
    }
}
