#![deny(warnings)]

//! Persistence layer: the key-value save store and the typed view over it.
//!
//! The original save format is a flat string-keyed map (one entry per game
//! aspect), so the store trait mirrors that: `get`/`set`/`remove`/`clear`
//! over strings. [`SaveGame`] layers the typed game keys on top with
//! lenient recovery, so a missing or corrupt entry falls back to its
//! default instead of failing the load.

use rust_decimal::Decimal;
use sim_core::{GameState, RateSnapshot, Record, Scenario, MAX_DAYS};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Persisted key names.
pub mod keys {
    pub const DAY: &str = "day";
    pub const BALANCE: &str = "balance";
    pub const TRADE_HISTORY: &str = "tradeHistory";
    pub const BALANCE_OVER_TIME: &str = "balanceOverTime";
    pub const CHOSEN_SCENARIOS: &str = "chosenScenarios";

    /// Key for the rate snapshot of one day.
    pub fn rates_for_day(day: u32) -> String {
        format!("exchangeRatesForDay{day}")
    }
}

/// A string key-value store with the semantics of a browser origin store:
/// synchronous, per-save, no transactions.
pub trait KvStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
    fn clear(&mut self);
}

/// In-memory store used by tests and ephemeral sessions.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    map: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.map.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.map.remove(key);
    }

    fn clear(&mut self) {
        self.map.clear();
    }
}

/// File-backed store: the whole map lives in one JSON file, loaded at open
/// and written back after every mutation (write-through, like the browser
/// store it replaces).
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    map: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Open a save file, creating an empty store when the file is missing.
    /// A file that exists but does not parse is treated as absent.
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let map = match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(map) => map,
                Err(err) => {
                    warn!(path = %path.display(), %err, "corrupt save file, starting fresh");
                    BTreeMap::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self { path, map })
    }

    fn write_back(&self) {
        let text = match serde_json::to_string_pretty(&self.map) {
            Ok(text) => text,
            Err(err) => {
                warn!(%err, "could not serialize save map");
                return;
            }
        };
        if let Err(err) = std::fs::write(&self.path, text) {
            warn!(path = %self.path.display(), %err, "could not write save file");
        }
    }
}

impl KvStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.map.insert(key.to_string(), value.to_string());
        self.write_back();
    }

    fn remove(&mut self, key: &str) {
        self.map.remove(key);
        self.write_back();
    }

    fn clear(&mut self) {
        self.map.clear();
        self.write_back();
    }
}

/// Typed load/save layer over the game's persisted keys.
#[derive(Debug)]
pub struct SaveGame<S> {
    store: S,
}

impl<S: KvStore> SaveGame<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Rebuild the game state from the store.
    ///
    /// Recovery is lenient: any key that is missing or fails to parse is
    /// replaced by its default, never reported as an error.
    pub fn load_state(&self) -> GameState {
        let day = self
            .store
            .get(keys::DAY)
            .and_then(|s| s.parse::<u32>().ok())
            .filter(|d| (1..=MAX_DAYS).contains(d))
            .unwrap_or(1);
        let balance = self
            .store
            .get(keys::BALANCE)
            .and_then(|s| s.parse::<Decimal>().ok())
            .unwrap_or_else(sim_core::starting_balance);
        let history: Vec<Record> = self
            .store
            .get(keys::TRADE_HISTORY)
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default();
        let balance_over_time: Vec<Decimal> = self
            .store
            .get(keys::BALANCE_OVER_TIME)
            .and_then(|s| serde_json::from_str(&s).ok())
            .filter(|v: &Vec<Decimal>| !v.is_empty())
            .unwrap_or_else(|| vec![balance]);
        GameState {
            day,
            balance,
            history,
            balance_over_time,
        }
    }

    /// Persist balance, history, series, and day, in that order.
    pub fn save_state(&mut self, state: &GameState) {
        self.store.set(keys::BALANCE, &state.balance.to_string());
        if let Ok(history) = serde_json::to_string(&state.history) {
            self.store.set(keys::TRADE_HISTORY, &history);
        }
        if let Ok(series) = serde_json::to_string(&state.balance_over_time) {
            self.store.set(keys::BALANCE_OVER_TIME, &series);
        }
        self.store.set(keys::DAY, &state.day.to_string());
    }

    /// Persisted rate snapshot for `day`, if one exists.
    pub fn load_rates(&self, day: u32) -> Option<RateSnapshot> {
        self.store
            .get(&keys::rates_for_day(day))
            .and_then(|s| serde_json::from_str(&s).ok())
    }

    pub fn store_rates(&mut self, day: u32, snapshot: &RateSnapshot) {
        if let Ok(text) = serde_json::to_string(snapshot) {
            self.store.set(&keys::rates_for_day(day), &text);
        }
    }

    /// The per-game scenario subset, if one has been selected.
    /// A persisted subset of the wrong length is treated as absent.
    pub fn load_scenarios(&self) -> Option<Vec<Scenario>> {
        self.store
            .get(keys::CHOSEN_SCENARIOS)
            .and_then(|s| serde_json::from_str::<Vec<Scenario>>(&s).ok())
            .filter(|v| v.len() == MAX_DAYS as usize)
    }

    pub fn store_scenarios(&mut self, chosen: &[Scenario]) {
        if let Ok(text) = serde_json::to_string(chosen) {
            self.store.set(keys::CHOSEN_SCENARIOS, &text);
        }
    }

    /// Drop every persisted key. Only reset uses this.
    pub fn clear(&mut self) {
        self.store.clear();
    }
}
