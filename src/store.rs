//! Storage seams.
//!
//! The engine persists games through `GameStore`, which holds one document
//! per game plus an append-only snapshot log, and remembers which boat this
//! client plays through `IdentityStore`. In-memory implementations back the
//! tests, the line-protocol driver, and self-play.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::board::boat::BoatId;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("stored document is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("store lock was poisoned")]
    Poisoned,
    #[error("stored boat id {0:?} is not a valid id")]
    BadBoatId(String),
}

/// One snapshot in the game log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub game_id: String,
    /// Milliseconds since the Unix epoch.
    pub taken_at: i64,
    pub game: Value,
}

impl LogEntry {
    /// Stamps `game` with the current time.
    pub fn now(game_id: impl Into<String>, game: Value) -> Self {
        LogEntry {
            game_id: game_id.into(),
            taken_at: Utc::now().timestamp_millis(),
            game,
        }
    }
}

/// Game documents and their snapshot log.
pub trait GameStore {
    /// The current record for `game_id`, if one exists.
    fn load(&self, game_id: &str) -> Result<Option<Value>, StoreError>;

    /// Replaces the record for `game_id`.
    fn save(&mut self, game_id: &str, record: &Value) -> Result<(), StoreError>;

    fn append_log(&mut self, entry: LogEntry) -> Result<(), StoreError>;

    /// The `count` most recent snapshots of `game_id`, newest first.
    fn history(&self, game_id: &str, count: usize) -> Result<Vec<LogEntry>, StoreError>;

    /// Every snapshot of `game_id`, oldest first.
    fn replay(&self, game_id: &str) -> Result<Vec<LogEntry>, StoreError>;
}

/// Documents held as JSON text, the way a document database would hand
/// them back.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: HashMap<String, String>,
    log: Vec<LogEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn log_len(&self) -> usize {
        self.log.len()
    }
}

impl GameStore for MemoryStore {
    fn load(&self, game_id: &str) -> Result<Option<Value>, StoreError> {
        match self.docs.get(game_id) {
            Some(text) => Ok(Some(serde_json::from_str(text)?)),
            None => Ok(None),
        }
    }

    fn save(&mut self, game_id: &str, record: &Value) -> Result<(), StoreError> {
        let text = serde_json::to_string(record)?;
        self.docs.insert(game_id.to_string(), text);
        Ok(())
    }

    fn append_log(&mut self, entry: LogEntry) -> Result<(), StoreError> {
        self.log.push(entry);
        Ok(())
    }

    fn history(&self, game_id: &str, count: usize) -> Result<Vec<LogEntry>, StoreError> {
        Ok(self
            .log
            .iter()
            .rev()
            .filter(|e| e.game_id == game_id)
            .take(count)
            .cloned()
            .collect())
    }

    fn replay(&self, game_id: &str) -> Result<Vec<LogEntry>, StoreError> {
        Ok(self
            .log
            .iter()
            .filter(|e| e.game_id == game_id)
            .cloned()
            .collect())
    }
}

/// A `MemoryStore` shared between several engines, one per client.
#[derive(Debug, Clone, Default)]
pub struct SharedStore {
    inner: Arc<Mutex<MemoryStore>>,
}

impl SharedStore {
    pub fn new() -> Self {
        SharedStore::default()
    }

    fn with<T>(&self, f: impl FnOnce(&mut MemoryStore) -> Result<T, StoreError>) -> Result<T, StoreError> {
        let mut guard = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        f(&mut guard)
    }
}

impl GameStore for SharedStore {
    fn load(&self, game_id: &str) -> Result<Option<Value>, StoreError> {
        self.with(|s| s.load(game_id))
    }

    fn save(&mut self, game_id: &str, record: &Value) -> Result<(), StoreError> {
        self.with(|s| s.save(game_id, record))
    }

    fn append_log(&mut self, entry: LogEntry) -> Result<(), StoreError> {
        self.with(|s| s.append_log(entry))
    }

    fn history(&self, game_id: &str, count: usize) -> Result<Vec<LogEntry>, StoreError> {
        self.with(|s| s.history(game_id, count))
    }

    fn replay(&self, game_id: &str) -> Result<Vec<LogEntry>, StoreError> {
        self.with(|s| s.replay(game_id))
    }
}

/// Key under which a client remembers its boat for `game_id`.
pub fn identity_key(game_id: &str) -> String {
    format!("ready-about.{}.boat-id", game_id)
}

/// Which boat this client plays in each game.
pub trait IdentityStore {
    fn boat_id(&self, game_id: &str) -> Result<Option<BoatId>, StoreError>;

    fn set_boat_id(&mut self, game_id: &str, boat_id: BoatId) -> Result<(), StoreError>;
}

/// String key/value identity storage, like a browser's local storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryIdentity {
    entries: HashMap<String, String>,
}

impl MemoryIdentity {
    pub fn new() -> Self {
        MemoryIdentity::default()
    }
}

impl IdentityStore for MemoryIdentity {
    fn boat_id(&self, game_id: &str) -> Result<Option<BoatId>, StoreError> {
        match self.entries.get(&identity_key(game_id)) {
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| StoreError::BadBoatId(raw.clone())),
            None => Ok(None),
        }
    }

    fn set_boat_id(&mut self, game_id: &str, boat_id: BoatId) -> Result<(), StoreError> {
        self.entries.insert(identity_key(game_id), boat_id.to_string());
        Ok(())
    }
}

/// Counts writes per time window and trips for good once a window holds
/// more than `limit` writes.
#[derive(Debug, Clone)]
pub struct WriteBreaker {
    limit: Option<usize>,
    window: Duration,
    window_start: Instant,
    writes: usize,
    tripped: bool,
}

impl WriteBreaker {
    pub fn new(limit: usize, window: Duration) -> Self {
        WriteBreaker {
            limit: Some(limit),
            window,
            window_start: Instant::now(),
            writes: 0,
            tripped: false,
        }
    }

    /// A breaker that never trips.
    pub fn disabled() -> Self {
        WriteBreaker {
            limit: None,
            window: Duration::ZERO,
            window_start: Instant::now(),
            writes: 0,
            tripped: false,
        }
    }

    /// Records one write. Returns false once the breaker has tripped.
    pub fn allow(&mut self) -> bool {
        self.allow_at(Instant::now())
    }

    fn allow_at(&mut self, now: Instant) -> bool {
        if self.tripped {
            return false;
        }
        let Some(limit) = self.limit else {
            return true;
        };
        if now.duration_since(self.window_start) >= self.window {
            self.window_start = now;
            self.writes = 0;
        }
        self.writes += 1;
        if self.writes > limit {
            self.tripped = true;
            log::error!(
                "write breaker tripped: {} writes within {:?}, halting all further writes",
                self.writes,
                self.window
            );
            return false;
        }
        true
    }

    pub fn is_tripped(&self) -> bool {
        self.tripped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn save_and_load_roundtrip() {
        let mut store = MemoryStore::new();
        assert!(store.load("g1").unwrap().is_none());
        store.save("g1", &json!({ "gameId": "g1", "started": true })).unwrap();
        assert_eq!(store.load("g1").unwrap(), Some(json!({ "gameId": "g1", "started": true })));
    }

    #[test]
    fn history_is_newest_first_and_replay_oldest_first() {
        let mut store = MemoryStore::new();
        for i in 0..5 {
            store.append_log(LogEntry::now("g1", json!({ "n": i }))).unwrap();
            store.append_log(LogEntry::now("other", json!({ "n": 100 + i }))).unwrap();
        }
        let recent: Vec<Value> = store.history("g1", 2).unwrap().into_iter().map(|e| e.game).collect();
        assert_eq!(recent, vec![json!({ "n": 4 }), json!({ "n": 3 })]);
        let all: Vec<Value> = store.replay("g1").unwrap().into_iter().map(|e| e.game).collect();
        assert_eq!(all.len(), 5);
        assert_eq!(all[0], json!({ "n": 0 }));
        assert_eq!(store.log_len(), 10);
    }

    #[test]
    fn shared_store_sees_every_write() {
        let a = SharedStore::new();
        let mut b = a.clone();
        b.save("g1", &json!({ "gameId": "g1" })).unwrap();
        assert!(a.load("g1").unwrap().is_some());
    }

    #[test]
    fn identity_uses_namespaced_key() {
        assert_eq!(identity_key("abc"), "ready-about.abc.boat-id");
        let mut ids = MemoryIdentity::new();
        let id = Uuid::from_u128(42);
        assert_eq!(ids.boat_id("abc").unwrap(), None);
        ids.set_boat_id("abc", id).unwrap();
        assert_eq!(ids.boat_id("abc").unwrap(), Some(id));
        assert_eq!(ids.boat_id("xyz").unwrap(), None);
    }

    #[test]
    fn breaker_trips_on_a_write_storm() {
        let mut breaker = WriteBreaker::new(3, Duration::from_secs(60));
        let t0 = Instant::now();
        assert!(breaker.allow_at(t0));
        assert!(breaker.allow_at(t0));
        assert!(breaker.allow_at(t0));
        assert!(!breaker.allow_at(t0));
        assert!(breaker.is_tripped());
        assert!(!breaker.allow_at(t0 + Duration::from_secs(120)));
    }

    #[test]
    fn breaker_window_resets() {
        let mut breaker = WriteBreaker::new(2, Duration::from_millis(10));
        let t0 = Instant::now();
        assert!(breaker.allow_at(t0));
        assert!(breaker.allow_at(t0));
        assert!(breaker.allow_at(t0 + Duration::from_millis(10)));
        assert!(breaker.allow_at(t0 + Duration::from_millis(11)));
        assert!(!breaker.is_tripped());
    }

    #[test]
    fn disabled_breaker_never_trips() {
        let mut breaker = WriteBreaker::disabled();
        for _ in 0..10_000 {
            assert!(breaker.allow());
        }
    }
}
