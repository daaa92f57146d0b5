//! Per-session scoreboards and UI event dispatch.
//! Every browser session owns its own `StatStore` and image slots; the registry maps
//! session ids to them so concurrent users never share counters.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::compose::compose_data_uri;
use crate::config::{SessionLimits, StatCatalog, StatGroup};
use crate::error::{Result, ScoreError};
use crate::fonts::Fonts;
use crate::stats::{StatStore, Team};
use crate::table::{render_table, ScoreTable};

pub type SessionId = u64;

/// A user action from the host page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiEvent {
    /// Stat button clicked
    Increment { team: Team, stat: String },
    /// Team name input changed
    SetLabel { team: Team, text: String },
    /// "Generate images" button clicked
    GenerateImages,
    /// Zero all counters
    Reset,
    /// Re-read the table without changing anything
    Refresh,
}

/// The two image slots of the page. `None` until images are generated.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ImageSlots {
    pub group1: Option<String>,
    pub group2: Option<String>,
}

impl ImageSlots {
    pub fn get(&self, group: StatGroup) -> Option<&str> {
        match group {
            StatGroup::Group1 => self.group1.as_deref(),
            StatGroup::Group2 => self.group2.as_deref(),
        }
    }
}

/// What the page needs after an event: the fresh table and the image slots.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EventOutcome {
    pub table: ScoreTable,
    pub images: ImageSlots,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug)]
pub struct Session {
    store: StatStore,
    images: ImageSlots,
}

impl Session {
    pub fn new(catalog: Arc<StatCatalog>) -> Self {
        Self {
            store: StatStore::new(catalog),
            images: ImageSlots::default(),
        }
    }

    pub fn store(&self) -> &StatStore {
        &self.store
    }

    pub fn images(&self) -> &ImageSlots {
        &self.images
    }

    pub fn table(&self) -> ScoreTable {
        render_table(self.store.catalog(), &self.store.snapshot())
    }

    /// Applies one event. Invalid stats and encoding failures become a `warning`
    /// on the outcome; the session is left unchanged by them.
    pub fn apply(&mut self, event: UiEvent, fonts: &Fonts) -> EventOutcome {
        let warning = match self.try_apply(event, fonts) {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(error = %e, "event ignored");
                Some(e.to_string())
            }
        };
        EventOutcome {
            table: self.table(),
            images: self.images.clone(),
            warning,
        }
    }

    fn try_apply(&mut self, event: UiEvent, fonts: &Fonts) -> Result<()> {
        match event {
            UiEvent::Increment { team, stat } => {
                self.store.increment(team, &stat)?;
            }
            UiEvent::SetLabel { team, text } => self.store.set_label(team, text),
            UiEvent::GenerateImages => self.images = self.generate(fonts)?,
            UiEvent::Reset => self.store.reset(),
            UiEvent::Refresh => {}
        }
        Ok(())
    }

    fn generate(&self, fonts: &Fonts) -> Result<ImageSlots> {
        let catalog = self.store.catalog();
        let snapshot = self.store.snapshot();
        Ok(ImageSlots {
            group1: Some(compose_data_uri(catalog, fonts, &snapshot, StatGroup::Group1)?),
            group2: Some(compose_data_uri(catalog, fonts, &snapshot, StatGroup::Group2)?),
        })
    }
}

/// Locks a session, recovering the data if a previous holder panicked.
pub fn lock(session: &Mutex<Session>) -> MutexGuard<'_, Session> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
struct Entry {
    session: Arc<Mutex<Session>>,
    touched: Mutex<Instant>,
}

impl Entry {
    fn last_touched(&self) -> Instant {
        *self.touched.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// All live sessions, keyed by id.
///
/// Sessions untouched for `idle_timeout` are dropped, and at most `max_sessions` are kept
/// (least recently used goes first). Both are enforced whenever a session is created.
#[derive(Debug)]
pub struct SessionRegistry {
    catalog: Arc<StatCatalog>,
    limits: SessionLimits,
    next_id: AtomicU64,
    sessions: RwLock<HashMap<SessionId, Entry>>,
}

impl SessionRegistry {
    pub fn new(catalog: Arc<StatCatalog>) -> Self {
        Self::with_limits(catalog, SessionLimits::default())
    }

    pub fn with_limits(catalog: Arc<StatCatalog>, limits: SessionLimits) -> Self {
        Self {
            catalog,
            limits,
            next_id: AtomicU64::new(1),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn catalog(&self) -> &Arc<StatCatalog> {
        &self.catalog
    }

    /// Starts a fresh scoreboard with zeroed counters and blank labels.
    pub fn create(&self) -> (SessionId, Arc<Mutex<Session>>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let session = Arc::new(Mutex::new(Session::new(self.catalog.clone())));

        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        self.prune(&mut sessions);
        sessions.insert(
            id,
            Entry {
                session: session.clone(),
                touched: Mutex::new(Instant::now()),
            },
        );
        tracing::info!(session = id, live = sessions.len(), "session created");
        (id, session)
    }

    /// Looks up a session and marks it as recently used.
    pub fn get(&self, id: SessionId) -> Result<Arc<Mutex<Session>>> {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        let entry = sessions.get(&id).ok_or(ScoreError::UnknownSession(id))?;
        *entry.touched.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
        Ok(entry.session.clone())
    }

    pub fn remove(&self, id: SessionId) -> bool {
        let removed = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some();
        if removed {
            tracing::info!(session = id, "session closed");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops idle sessions, then the least recently used ones until a new one fits.
    fn prune(&self, sessions: &mut HashMap<SessionId, Entry>) {
        let idle_timeout = self.limits.idle_timeout();
        let before = sessions.len();
        sessions.retain(|_, entry| entry.last_touched().elapsed() < idle_timeout);
        let expired = before - sessions.len();

        let mut evicted = 0;
        while sessions.len() >= self.limits.max_sessions.max(1) {
            let Some(oldest) = sessions
                .iter()
                .min_by_key(|(id, entry)| (entry.last_touched(), **id))
                .map(|(id, _)| *id)
            else {
                break;
            };
            sessions.remove(&oldest);
            evicted += 1;
        }

        if expired + evicted > 0 {
            tracing::info!(expired, evicted, live = sessions.len(), "sessions pruned");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::from_data_uri;
    use crate::config::FontConfig;

    fn catalog() -> Arc<StatCatalog> {
        Arc::new(StatCatalog::with_groups(&["Goals", "Shots"], &["Fouls"]).unwrap())
    }

    fn fonts() -> Fonts {
        Fonts::builtin(&FontConfig::default())
    }

    fn increment(team: Team, stat: &str) -> UiEvent {
        UiEvent::Increment {
            team,
            stat: stat.to_string(),
        }
    }

    #[test]
    fn test_event_json_is_tagged() {
        let event: UiEvent =
            serde_json::from_str(r#"{"type":"increment","team":"b","stat":"Shots"}"#).unwrap();
        assert_eq!(event, increment(Team::B, "Shots"));
        let event: UiEvent = serde_json::from_str(r#"{"type":"generate_images"}"#).unwrap();
        assert_eq!(event, UiEvent::GenerateImages);
    }

    #[test]
    fn test_increment_updates_table() {
        let mut session = Session::new(catalog());
        let outcome = session.apply(increment(Team::A, "Shots"), &fonts());
        assert!(outcome.warning.is_none());
        assert_eq!(outcome.table.rows[1].count_a, 1);
    }

    #[test]
    fn test_invalid_stat_becomes_warning() {
        let mut session = Session::new(catalog());
        let before = session.table();
        let outcome = session.apply(increment(Team::A, "a-Goals"), &fonts());
        assert!(outcome.warning.unwrap().contains("a-Goals"));
        assert_eq!(outcome.table, before);
    }

    #[test]
    fn test_refresh_changes_nothing() {
        let mut session = Session::new(catalog());
        session.apply(increment(Team::B, "Fouls"), &fonts());
        let before = session.table();
        let outcome = session.apply(UiEvent::Refresh, &fonts());
        assert_eq!(outcome.table, before);
    }

    #[test]
    fn test_images_start_empty_then_fill() {
        let mut session = Session::new(catalog());
        assert_eq!(session.images(), &ImageSlots::default());

        let outcome = session.apply(UiEvent::GenerateImages, &fonts());
        let g1 = outcome.images.get(StatGroup::Group1).unwrap();
        let g2 = outcome.images.get(StatGroup::Group2).unwrap();
        assert!(from_data_uri(g1).is_some());
        assert_ne!(g1, g2);
    }

    #[test]
    fn test_images_are_not_refreshed_by_increments() {
        let mut session = Session::new(catalog());
        session.apply(UiEvent::GenerateImages, &fonts());
        let generated = session.images().clone();
        session.apply(increment(Team::A, "Goals"), &fonts());
        assert_eq!(session.images(), &generated);
    }

    #[test]
    fn test_sessions_are_isolated() {
        let registry = SessionRegistry::new(catalog());
        let (id_a, first) = registry.create();
        let (id_b, second) = registry.create();
        assert_ne!(id_a, id_b);

        lock(&first).apply(increment(Team::A, "Goals"), &fonts());
        assert_eq!(lock(&first).store().snapshot().team_a.get("Goals"), Some(1));
        assert_eq!(lock(&second).store().snapshot().team_a.get("Goals"), Some(0));
    }

    #[test]
    fn test_registry_get_and_remove() {
        let registry = SessionRegistry::new(catalog());
        let (id, _) = registry.create();
        assert!(registry.get(id).is_ok());
        assert_eq!(registry.len(), 1);
        assert!(registry.remove(id));
        assert!(matches!(registry.get(id), Err(ScoreError::UnknownSession(n)) if n == id));
        assert!(registry.is_empty());
    }

    fn limits(idle_timeout_secs: u64, max_sessions: usize) -> SessionLimits {
        SessionLimits {
            idle_timeout_secs,
            max_sessions,
        }
    }

    #[test]
    fn test_registry_caps_live_sessions() {
        let registry = SessionRegistry::with_limits(catalog(), limits(3600, 3));
        let ids: Vec<SessionId> = (0..1000).map(|_| registry.create().0).collect();
        assert_eq!(registry.len(), 3);
        for id in &ids[997..] {
            assert!(registry.get(*id).is_ok());
        }
        assert!(registry.get(ids[0]).is_err());
    }

    #[test]
    fn test_registry_evicts_least_recently_used() {
        let registry = SessionRegistry::with_limits(catalog(), limits(3600, 2));
        let (first, _) = registry.create();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let (second, _) = registry.create();
        std::thread::sleep(std::time::Duration::from_millis(2));
        registry.get(first).unwrap();
        let (third, _) = registry.create();

        assert!(registry.get(first).is_ok());
        assert!(registry.get(third).is_ok());
        assert!(matches!(registry.get(second), Err(ScoreError::UnknownSession(_))));
    }

    #[test]
    fn test_registry_drops_idle_sessions() {
        let registry = SessionRegistry::with_limits(catalog(), limits(0, 100));
        let (first, _) = registry.create();
        let (second, _) = registry.create();
        assert!(registry.get(first).is_err());
        assert!(registry.get(second).is_ok());
        assert_eq!(registry.len(), 1);
    }
}
