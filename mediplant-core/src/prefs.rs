//! User side-state: favorites, comparison, recency, search history
//!
//! Independent of search results and persisted after every mutation through
//! an injected [`StateStore`]. A failed persist is logged and the in-memory
//! state keeps going; losing the last mutation on a crash is acceptable,
//! losing interactivity is not.

use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Comparison list holds at most this many plants.
pub const MAX_COMPARED: usize = 4;

/// Recently-viewed list holds at most this many plants.
pub const MAX_RECENT: usize = 5;

/// Search history holds at most this many entries, newest first.
pub const MAX_HISTORY: usize = 20;

/// Failure while loading or saving the persisted snapshot.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("state io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("state decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

/// One recorded search submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub query: String,
    /// Unix timestamp in seconds.
    pub timestamp: u64,
}

/// The serialized form of the side-state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    #[serde(default)]
    pub favorite_plants: Vec<String>,
    #[serde(default)]
    pub compared_plants: Vec<String>,
    #[serde(default)]
    pub recently_viewed: Vec<String>,
    #[serde(default)]
    pub search_history: Vec<HistoryEntry>,
}

/// Opaque persistence collaborator for the side-state.
pub trait StateStore {
    fn load(&self) -> Result<Option<StateSnapshot>, StateError>;
    fn save(&self, snapshot: &StateSnapshot) -> Result<(), StateError>;
}

/// JSON file on disk, the CLI's stand-in for browser storage.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> Result<Option<StateSnapshot>, StateError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save(&self, snapshot: &StateSnapshot) -> Result<(), StateError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(snapshot)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Option<StateSnapshot>>,
}

impl MemoryStore {
    /// The last saved snapshot, if any.
    #[must_use]
    pub fn snapshot(&self) -> Option<StateSnapshot> {
        self.inner.lock().unwrap().clone()
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<Option<StateSnapshot>, StateError> {
        Ok(self.inner.lock().unwrap().clone())
    }

    fn save(&self, snapshot: &StateSnapshot) -> Result<(), StateError> {
        *self.inner.lock().unwrap() = Some(snapshot.clone());
        Ok(())
    }
}

/// Mutable side-state over an injected store. Mutations are synchronous and
/// persist immediately.
pub struct UserSideState<S: StateStore> {
    snapshot: StateSnapshot,
    store: S,
}

impl<S: StateStore> UserSideState<S> {
    /// Load the persisted snapshot, falling back to an empty state when
    /// nothing is stored or the stored blob is unreadable.
    pub fn load(store: S) -> Self {
        let mut snapshot = match store.load() {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => StateSnapshot::default(),
            Err(err) => {
                warn!(error = %err, "failed to load user state, starting fresh");
                StateSnapshot::default()
            }
        };
        // Stored blobs predating the caps get truncated on the way in.
        snapshot.compared_plants.truncate(MAX_COMPARED);
        snapshot.recently_viewed.truncate(MAX_RECENT);
        snapshot.search_history.truncate(MAX_HISTORY);

        Self { snapshot, store }
    }

    /// Flip favorite membership. Returns `true` when the plant was added.
    pub fn toggle_favorite(&mut self, plant_id: &str) -> bool {
        let added = match self
            .snapshot
            .favorite_plants
            .iter()
            .position(|id| id == plant_id)
        {
            Some(index) => {
                self.snapshot.favorite_plants.remove(index);
                false
            }
            None => {
                self.snapshot.favorite_plants.push(plant_id.to_string());
                true
            }
        };
        self.persist();
        added
    }

    #[must_use]
    pub fn is_favorite(&self, plant_id: &str) -> bool {
        self.snapshot.favorite_plants.iter().any(|id| id == plant_id)
    }

    #[must_use]
    pub fn favorites(&self) -> &[String] {
        &self.snapshot.favorite_plants
    }

    /// Add to the comparison list. Returns `false` without mutating when the
    /// list is full or already contains the plant.
    pub fn add_to_comparison(&mut self, plant_id: &str) -> bool {
        if self.snapshot.compared_plants.len() >= MAX_COMPARED
            || self.snapshot.compared_plants.iter().any(|id| id == plant_id)
        {
            return false;
        }
        self.snapshot.compared_plants.push(plant_id.to_string());
        self.persist();
        true
    }

    pub fn remove_from_comparison(&mut self, plant_id: &str) -> bool {
        match self
            .snapshot
            .compared_plants
            .iter()
            .position(|id| id == plant_id)
        {
            Some(index) => {
                self.snapshot.compared_plants.remove(index);
                self.persist();
                true
            }
            None => false,
        }
    }

    pub fn clear_comparison(&mut self) {
        self.snapshot.compared_plants.clear();
        self.persist();
    }

    #[must_use]
    pub fn compared_plants(&self) -> &[String] {
        &self.snapshot.compared_plants
    }

    /// Record a viewed plant. Already-listed plants keep their position.
    pub fn add_recently_viewed(&mut self, plant_id: &str) {
        if self.snapshot.recently_viewed.iter().any(|id| id == plant_id) {
            return;
        }
        self.snapshot.recently_viewed.push(plant_id.to_string());
        if self.snapshot.recently_viewed.len() > MAX_RECENT {
            self.snapshot.recently_viewed.remove(0);
        }
        self.persist();
    }

    #[must_use]
    pub fn recently_viewed(&self) -> &[String] {
        &self.snapshot.recently_viewed
    }

    /// Record a submitted search, newest first.
    pub fn record_search(&mut self, query: &str) {
        self.snapshot.search_history.insert(
            0,
            HistoryEntry {
                query: query.to_string(),
                timestamp: unix_now(),
            },
        );
        self.snapshot.search_history.truncate(MAX_HISTORY);
        self.persist();
    }

    #[must_use]
    pub fn search_history(&self) -> &[HistoryEntry] {
        &self.snapshot.search_history
    }

    pub fn clear_history(&mut self) {
        self.snapshot.search_history.clear();
        self.persist();
    }

    fn persist(&self) {
        if let Err(err) = self.store.save(&self.snapshot) {
            warn!(error = %err, "failed to persist user state");
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> UserSideState<MemoryStore> {
        UserSideState::load(MemoryStore::default())
    }

    #[test]
    fn test_double_toggle_restores_membership() {
        let mut state = fresh();

        assert!(state.toggle_favorite("aloe"));
        assert!(state.is_favorite("aloe"));

        assert!(!state.toggle_favorite("aloe"));
        assert!(!state.is_favorite("aloe"));
        assert!(state.favorites().is_empty());
    }

    #[test]
    fn test_comparison_is_capped_at_four() {
        let mut state = fresh();

        for id in ["aloe", "ginger", "turmeric", "lavender"] {
            assert!(state.add_to_comparison(id));
        }
        // Fifth add is a no-op returning failure.
        assert!(!state.add_to_comparison("chamomile"));
        assert_eq!(state.compared_plants().len(), 4);
        assert!(!state.compared_plants().contains(&"chamomile".to_string()));
    }

    #[test]
    fn test_duplicate_comparison_add_fails() {
        let mut state = fresh();
        assert!(state.add_to_comparison("aloe"));
        assert!(!state.add_to_comparison("aloe"));
        assert_eq!(state.compared_plants().len(), 1);
    }

    #[test]
    fn test_comparison_remove_and_clear() {
        let mut state = fresh();
        state.add_to_comparison("aloe");
        state.add_to_comparison("ginger");

        assert!(state.remove_from_comparison("aloe"));
        assert!(!state.remove_from_comparison("aloe"));
        assert_eq!(state.compared_plants(), ["ginger"]);

        state.clear_comparison();
        assert!(state.compared_plants().is_empty());
    }

    #[test]
    fn test_recently_viewed_keeps_last_five() {
        let mut state = fresh();
        for id in ["a", "b", "c", "d", "e", "f"] {
            state.add_recently_viewed(id);
        }
        assert_eq!(state.recently_viewed(), ["b", "c", "d", "e", "f"]);

        // Re-viewing keeps the existing position.
        state.add_recently_viewed("c");
        assert_eq!(state.recently_viewed(), ["b", "c", "d", "e", "f"]);
    }

    #[test]
    fn test_history_is_newest_first_and_capped() {
        let mut state = fresh();
        for i in 0..25 {
            state.record_search(&format!("query {i}"));
        }
        assert_eq!(state.search_history().len(), MAX_HISTORY);
        assert_eq!(state.search_history()[0].query, "query 24");

        state.clear_history();
        assert!(state.search_history().is_empty());
    }

    #[test]
    fn test_every_mutation_is_persisted() {
        let mut state = fresh();
        state.toggle_favorite("aloe");

        let saved = state.store.snapshot().expect("snapshot saved");
        assert_eq!(saved.favorite_plants, ["aloe"]);

        state.add_to_comparison("ginger");
        let saved = state.store.snapshot().expect("snapshot saved");
        assert_eq!(saved.compared_plants, ["ginger"]);
    }

    #[test]
    fn test_file_store_round_trip() {
        let path = std::env::temp_dir().join(format!("mediplant-state-{}.json", std::process::id()));
        let store = JsonFileStore::new(&path);

        let mut state = UserSideState::load(store);
        state.toggle_favorite("aloe");
        state.record_search("burns");

        let reloaded = UserSideState::load(JsonFileStore::new(&path));
        assert!(reloaded.is_favorite("aloe"));
        assert_eq!(reloaded.search_history()[0].query, "burns");

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_oversized_stored_lists_are_truncated_on_load() {
        let store = MemoryStore::default();
        store
            .save(&StateSnapshot {
                compared_plants: (0..8).map(|i| i.to_string()).collect(),
                ..StateSnapshot::default()
            })
            .unwrap();

        let state = UserSideState::load(store);
        assert_eq!(state.compared_plants().len(), MAX_COMPARED);
    }
}
