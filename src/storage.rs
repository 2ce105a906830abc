//! Injected persistence port. The engine only ever talks to a [`ScoreStore`];
//! the string-keyed surface mirrors a browser-style key/value store so any
//! backend (memory, file, …) plugs in without touching game code.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The two game variants persist under separate fixed keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameKind {
    Classic,
    Pattern,
}

impl GameKind {
    pub fn best_score_key(self) -> &'static str {
        match self {
            GameKind::Classic => "2048-best-score",
            GameKind::Pattern => "pattern-2048-best-score",
        }
    }

    pub fn snapshot_key(self) -> &'static str {
        match self {
            GameKind::Classic => "2048-game-state",
            GameKind::Pattern => "pattern-2048-game-state",
        }
    }
}

/// Serialized game state, enough to restore a session. Cell value 0 means an
/// empty cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub cells: Vec<Vec<u32>>,
    pub score: u32,
    pub over: bool,
    pub won: bool,
}

/// Key/value persistence with typed helpers on top. Absent or unreadable
/// data yields defaults (0, `None`), never an error: losing a best score
/// must not take the game down.
pub trait ScoreStore {
    fn get(&self, key: &str) -> Option<String>;
    fn put(&mut self, key: &str, value: String);
    fn remove(&mut self, key: &str);

    fn best_score(&self, kind: GameKind) -> u32 {
        self.get(kind.best_score_key())
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(0)
    }

    fn save_best_score(&mut self, kind: GameKind, score: u32) {
        self.put(kind.best_score_key(), score.to_string());
    }

    fn load_snapshot(&self, kind: GameKind) -> Option<Snapshot> {
        let raw = self.get(kind.snapshot_key())?;

        match serde_json::from_str(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                log::warn!("discarding unreadable snapshot for {kind:?}: {err}");
                None
            }
        }
    }

    fn save_snapshot(&mut self, kind: GameKind, snapshot: &Snapshot) {
        match serde_json::to_string(snapshot) {
            Ok(raw) => self.put(kind.snapshot_key(), raw),
            Err(err) => log::warn!("failed to serialize snapshot for {kind:?}: {err}"),
        }
    }

    fn clear_snapshot(&mut self, kind: GameKind) {
        self.remove(kind.snapshot_key());
    }
}

/// Volatile store for tests and advisor auto-play.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScoreStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn put(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

/// All keys in one JSON object on disk. Read-modify-write on every put; fine
/// for a per-user CLI store. IO problems degrade to defaults with a warning.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_map(&self) -> HashMap<String, String> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return HashMap::new(),
            Err(err) => {
                log::warn!("cannot read {}: {err}", self.path.display());
                return HashMap::new();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|err| {
            log::warn!("cannot parse {}: {err}", self.path.display());
            HashMap::new()
        })
    }

    fn write_map(&self, map: &HashMap<String, String>) {
        let raw = match serde_json::to_string_pretty(map) {
            Ok(raw) => raw,
            Err(err) => {
                log::warn!("cannot serialize store: {err}");
                return;
            }
        };

        if let Err(err) = fs::write(&self.path, raw) {
            log::warn!("cannot write {}: {err}", self.path.display());
        }
    }
}

impl ScoreStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.read_map().get(key).cloned()
    }

    fn put(&mut self, key: &str, value: String) {
        let mut map = self.read_map();
        map.insert(key.to_string(), value);
        self.write_map(&map);
    }

    fn remove(&mut self, key: &str) {
        let mut map = self.read_map();
        if map.remove(key).is_some() {
            self.write_map(&map);
        }
    }
}
