use crate::domain::GameRecord;
use crate::error::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Composite key for the locale-scoped cache table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub identifier: String,
    pub locale: String,
}

impl CacheKey {
    pub fn new(identifier: impl Into<String>, locale: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            locale: locale.into(),
        }
    }

    pub fn storage_key(&self) -> String {
        format!("{}_{}", self.identifier, self.locale)
    }
}

/// A locale-scoped, TTL-bound snapshot distinct from the canonical record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub payload: GameRecord,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Durable store adapter over the canonical games table and the TTL-bound
/// API cache table. Writes are idempotent and last-write-wins; merge logic
/// lives upstream. Callers treat any store error as a cache miss.
pub trait Store: Send + Sync {
    fn load_canonical(&self, id: u64) -> Result<Option<GameRecord>>;
    fn save_canonical(&self, record: &GameRecord) -> Result<()>;
    fn load_cache_entry(&self, key: &CacheKey) -> Result<Option<CacheEntry>>;
    fn save_cache_entry(&self, key: &CacheKey, payload: &GameRecord, ttl: Duration) -> Result<()>;
    fn top_rated(&self, limit: usize) -> Result<Vec<GameRecord>>;
    fn purge_expired(&self) -> Result<usize>;
}
