use crate::domain::storage::{CacheEntry, CacheKey, Store};
use crate::domain::GameRecord;
use crate::error::{GameDataError, Result};
use chrono::{Duration, Utc};
use std::fs;
use std::path::PathBuf;
use tracing::warn;

const GAMES_DIR: &str = "games";
const API_CACHE_DIR: &str = "api_cache";

/// JSON-file backed store: canonical records under `games/<id>.json`, cache
/// table entries under `api_cache/<identifier>_<locale>.json`.
#[derive(Clone)]
pub struct FileSystemStore {
    data_dir: PathBuf,
    cache_dir: PathBuf,
}

impl FileSystemStore {
    pub fn new(data_dir: impl Into<PathBuf>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            cache_dir: cache_dir.into(),
        }
    }

    fn games_dir(&self) -> PathBuf {
        self.data_dir.join(GAMES_DIR)
    }

    fn api_cache_dir(&self) -> PathBuf {
        self.cache_dir.join(API_CACHE_DIR)
    }

    fn write_json_file<T: serde::Serialize + ?Sized>(&self, path: PathBuf, data: &T) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(store_err)?;
            }
        }
        let content = serde_json::to_string_pretty(data).map_err(store_err)?;
        fs::write(path, content).map_err(store_err)?;
        Ok(())
    }

    fn read_json_file<T: serde::de::DeserializeOwned>(&self, path: PathBuf) -> Result<Option<T>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path).map_err(store_err)?;
        Ok(Some(serde_json::from_str(&content).map_err(store_err)?))
    }
}

fn store_err(e: impl std::fmt::Display) -> GameDataError {
    GameDataError::Store(e.to_string())
}

impl Store for FileSystemStore {
    fn load_canonical(&self, id: u64) -> Result<Option<GameRecord>> {
        self.read_json_file(self.games_dir().join(format!("{id}.json")))
    }

    fn save_canonical(&self, record: &GameRecord) -> Result<()> {
        self.write_json_file(self.games_dir().join(format!("{}.json", record.id)), record)
    }

    fn load_cache_entry(&self, key: &CacheKey) -> Result<Option<CacheEntry>> {
        self.read_json_file(
            self.api_cache_dir()
                .join(format!("{}.json", key.storage_key())),
        )
    }

    fn save_cache_entry(&self, key: &CacheKey, payload: &GameRecord, ttl: Duration) -> Result<()> {
        let entry = CacheEntry {
            payload: payload.clone(),
            expires_at: Utc::now() + ttl,
        };
        self.write_json_file(
            self.api_cache_dir()
                .join(format!("{}.json", key.storage_key())),
            &entry,
        )
    }

    fn top_rated(&self, limit: usize) -> Result<Vec<GameRecord>> {
        let dir = self.games_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut games: Vec<GameRecord> = Vec::new();
        for entry in fs::read_dir(&dir).map_err(store_err)? {
            let path = entry.map_err(store_err)?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match self.read_json_file::<GameRecord>(path.clone()) {
                Ok(Some(game)) if game.metacritic.is_some() => games.push(game),
                Ok(_) => {}
                Err(e) => warn!("Skipping unreadable record {path:?}: {e}"),
            }
        }

        games.sort_by(|a, b| b.metacritic.cmp(&a.metacritic));
        games.truncate(limit);
        Ok(games)
    }

    fn purge_expired(&self) -> Result<usize> {
        let dir = self.api_cache_dir();
        if !dir.exists() {
            return Ok(0);
        }

        let now = Utc::now();
        let mut purged = 0;
        for entry in fs::read_dir(&dir).map_err(store_err)? {
            let path = entry.map_err(store_err)?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let expired = match self.read_json_file::<CacheEntry>(path.clone()) {
                Ok(Some(cache_entry)) => cache_entry.is_expired(now),
                Ok(None) => false,
                // Unreadable entries are dead weight, drop them too.
                Err(e) => {
                    warn!("Dropping corrupt cache entry {path:?}: {e}");
                    true
                }
            };
            if expired {
                fs::remove_file(&path).map_err(store_err)?;
                purged += 1;
            }
        }
        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (FileSystemStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = FileSystemStore::new(dir.path().join("data"), dir.path().join("cache"));
        (store, dir)
    }

    fn record(id: u64, metacritic: Option<u32>) -> GameRecord {
        let mut record = GameRecord::new(id, format!("game-{id}"), format!("Game {id}"));
        record.metacritic = metacritic;
        record
    }

    #[test]
    fn canonical_roundtrip() {
        let (store, _dir) = test_store();
        let game = record(3498, Some(92));

        store.save_canonical(&game).unwrap();
        let loaded = store.load_canonical(3498).unwrap().unwrap();
        assert_eq!(loaded.id, 3498);
        assert_eq!(loaded.metacritic, Some(92));

        assert!(store.load_canonical(9999).unwrap().is_none());
    }

    #[test]
    fn cache_entry_carries_expiry() {
        let (store, _dir) = test_store();
        let key = CacheKey::new("portal-2", "en");
        store
            .save_cache_entry(&key, &record(4200, None), Duration::days(7))
            .unwrap();

        let entry = store.load_cache_entry(&key).unwrap().unwrap();
        assert!(!entry.is_expired(Utc::now()));
        assert!(entry.is_expired(Utc::now() + Duration::days(8)));
    }

    #[test]
    fn cache_keys_are_locale_scoped() {
        let (store, _dir) = test_store();
        store
            .save_cache_entry(&CacheKey::new("42", "en"), &record(42, None), Duration::days(7))
            .unwrap();

        assert!(store
            .load_cache_entry(&CacheKey::new("42", "fr"))
            .unwrap()
            .is_none());
        assert!(store
            .load_cache_entry(&CacheKey::new("42", "en"))
            .unwrap()
            .is_some());
    }

    #[test]
    fn purge_removes_only_expired_entries() {
        let (store, _dir) = test_store();
        store
            .save_cache_entry(&CacheKey::new("dead", "en"), &record(1, None), Duration::seconds(-1))
            .unwrap();
        store
            .save_cache_entry(&CacheKey::new("live", "en"), &record(2, None), Duration::days(1))
            .unwrap();

        assert_eq!(store.purge_expired().unwrap(), 1);
        assert!(store
            .load_cache_entry(&CacheKey::new("dead", "en"))
            .unwrap()
            .is_none());
        assert!(store
            .load_cache_entry(&CacheKey::new("live", "en"))
            .unwrap()
            .is_some());
    }

    #[test]
    fn top_rated_sorts_by_metacritic_and_skips_unrated() {
        let (store, _dir) = test_store();
        store.save_canonical(&record(1, Some(80))).unwrap();
        store.save_canonical(&record(2, Some(95))).unwrap();
        store.save_canonical(&record(3, None)).unwrap();

        let top = store.top_rated(10).unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].id, 2);
        assert_eq!(top[1].id, 1);
    }
}
