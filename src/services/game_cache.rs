use crate::domain::source::GameSource;
use crate::domain::storage::{CacheKey, Store};
use crate::domain::{GameRecord, CANONICAL_TTL_DAYS};
use chrono::{DateTime, Duration, Utc};
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use rustc_hash::FxHashMap;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::warn;

type SharedGame = Shared<BoxFuture<'static, Option<Arc<GameRecord>>>>;
type SharedBatch = Shared<BoxFuture<'static, Arc<HashMap<String, Option<GameRecord>>>>>;

struct MemoryEntry {
    record: Arc<GameRecord>,
    expires_at: DateTime<Utc>,
}

struct BatchInflight {
    id: u64,
    locale: String,
    identifiers: HashSet<String>,
    future: SharedBatch,
}

/// Read-through cache in front of the resolver stack: a process-lifetime
/// in-memory map layered over the durable cache table, plus in-flight
/// registries guaranteeing at most one outstanding request per key. An
/// explicit service rather than a singleton so tests construct isolated
/// instances.
pub struct GameDataCache {
    source: Arc<dyn GameSource>,
    store: Arc<dyn Store>,
    memory: Arc<Mutex<FxHashMap<String, MemoryEntry>>>,
    inflight_single: Arc<Mutex<FxHashMap<String, SharedGame>>>,
    inflight_batches: Arc<Mutex<Vec<BatchInflight>>>,
    batch_seq: AtomicU64,
}

fn memory_key(identifier: &str, locale: &str) -> String {
    format!("{identifier}_{locale}")
}

impl GameDataCache {
    pub fn new(source: Arc<dyn GameSource>, store: Arc<dyn Store>) -> Self {
        Self {
            source,
            store,
            memory: Arc::new(Mutex::new(FxHashMap::default())),
            inflight_single: Arc::new(Mutex::new(FxHashMap::default())),
            inflight_batches: Arc::new(Mutex::new(Vec::new())),
            batch_seq: AtomicU64::new(0),
        }
    }

    /// Synchronous local tiers: memory first, then the durable cache table
    /// (which backfills memory on a hit). Store errors count as misses.
    fn lookup_local(&self, identifier: &str, locale: &str) -> Option<Arc<GameRecord>> {
        let key = memory_key(identifier, locale);
        let now = Utc::now();
        {
            let mut memory = self.memory.lock().unwrap();
            if let Some(entry) = memory.get(&key) {
                if now < entry.expires_at {
                    return Some(Arc::clone(&entry.record));
                }
                memory.remove(&key);
            }
        }

        match self.store.load_cache_entry(&CacheKey::new(identifier, locale)) {
            Ok(Some(entry)) if !entry.is_expired(now) => {
                let record = Arc::new(entry.payload);
                self.memory.lock().unwrap().insert(
                    key,
                    MemoryEntry {
                        record: Arc::clone(&record),
                        expires_at: entry.expires_at,
                    },
                );
                Some(record)
            }
            Ok(_) => None,
            Err(e) => {
                warn!("Durable cache read failed for {key}: {e}");
                None
            }
        }
    }

    pub async fn get_game(&self, identifier: &str, locale: &str) -> Option<GameRecord> {
        if let Some(hit) = self.lookup_local(identifier, locale) {
            return Some((*hit).clone());
        }

        let key = memory_key(identifier, locale);

        // Join an identical request already on the wire.
        let existing = self.inflight_single.lock().unwrap().get(&key).cloned();
        if let Some(future) = existing {
            return future.await.map(|record| (*record).clone());
        }

        // Adopt an in-flight batch that covers this identifier.
        if let Some(batch) = self.find_covering_batch(identifier, locale) {
            let results = batch.await;
            return results.get(identifier).cloned().flatten();
        }

        let future = {
            let mut singles = self.inflight_single.lock().unwrap();
            match singles.get(&key) {
                // Lost the race to another caller; share its request.
                Some(existing) => existing.clone(),
                None => {
                    let future = self.single_request(identifier, locale, &key);
                    singles.insert(key.clone(), future.clone());
                    future
                }
            }
        };
        future.await.map(|record| (*record).clone())
    }

    /// The returned map always has one entry per distinct input identifier,
    /// with `None` standing for "resolved to absent" — never an error.
    pub async fn get_games(
        &self,
        identifiers: &[String],
        locale: &str,
    ) -> HashMap<String, Option<GameRecord>> {
        let mut unique: Vec<String> = Vec::new();
        let mut seen = HashSet::new();
        for identifier in identifiers {
            if seen.insert(identifier.clone()) {
                unique.push(identifier.clone());
            }
        }

        let mut results: HashMap<String, Option<GameRecord>> =
            HashMap::with_capacity(unique.len());
        let mut needs_fetch: Vec<String> = Vec::new();
        for identifier in &unique {
            match self.lookup_local(identifier, locale) {
                Some(record) => {
                    results.insert(identifier.clone(), Some((*record).clone()));
                }
                None => needs_fetch.push(identifier.clone()),
            }
        }
        if needs_fetch.is_empty() {
            return results;
        }

        // Merge out of an overlapping in-flight batch before fetching.
        if let Some(batch) = self.find_overlapping_batch(&needs_fetch, locale) {
            let batch_results = batch.await;
            needs_fetch.retain(|identifier| match batch_results.get(identifier) {
                Some(entry) => {
                    results.insert(identifier.clone(), entry.clone());
                    false
                }
                None => true,
            });
        }
        if needs_fetch.is_empty() {
            return results;
        }

        let future = self.batch_request(&needs_fetch, locale);
        let fetched = future.await;
        for identifier in &needs_fetch {
            results.insert(
                identifier.clone(),
                fetched.get(identifier).cloned().flatten(),
            );
        }
        results
    }

    fn single_request(&self, identifier: &str, locale: &str, key: &str) -> SharedGame {
        let source = Arc::clone(&self.source);
        let memory = Arc::clone(&self.memory);
        let singles = Arc::clone(&self.inflight_single);
        let identifier = identifier.to_string();
        let locale = locale.to_string();
        let key = key.to_string();

        async move {
            let resolved = match source.fetch_game(&identifier, &locale).await {
                Ok(record) => record,
                Err(e) => {
                    warn!("Resolution failed for {identifier}: {e}");
                    None
                }
            };
            let record = resolved.map(Arc::new);
            if let Some(record) = &record {
                memory.lock().unwrap().insert(
                    key.clone(),
                    MemoryEntry {
                        record: Arc::clone(record),
                        expires_at: Utc::now() + Duration::days(CANONICAL_TTL_DAYS),
                    },
                );
            }
            // Deregister on settle regardless of outcome.
            singles.lock().unwrap().remove(&key);
            record
        }
        .boxed()
        .shared()
    }

    fn batch_request(&self, identifiers: &[String], locale: &str) -> SharedBatch {
        let source = Arc::clone(&self.source);
        let memory = Arc::clone(&self.memory);
        let batches = Arc::clone(&self.inflight_batches);
        let batch_id = self.batch_seq.fetch_add(1, Ordering::Relaxed);
        let identifiers_owned: Vec<String> = identifiers.to_vec();
        let locale_owned = locale.to_string();

        let future: SharedBatch = async move {
            let fetched = match source.fetch_games(&identifiers_owned, &locale_owned).await {
                Ok(map) => map,
                Err(e) => {
                    warn!("Batch resolution failed: {e}");
                    identifiers_owned
                        .iter()
                        .map(|id| (id.clone(), None))
                        .collect()
                }
            };
            {
                let mut memory = memory.lock().unwrap();
                let expires_at = Utc::now() + Duration::days(CANONICAL_TTL_DAYS);
                for (identifier, record) in &fetched {
                    if let Some(record) = record {
                        memory.insert(
                            memory_key(identifier, &locale_owned),
                            MemoryEntry {
                                record: Arc::new(record.clone()),
                                expires_at,
                            },
                        );
                    }
                }
            }
            batches.lock().unwrap().retain(|b| b.id != batch_id);
            Arc::new(fetched)
        }
        .boxed()
        .shared();

        self.inflight_batches.lock().unwrap().push(BatchInflight {
            id: batch_id,
            locale: locale.to_string(),
            identifiers: identifiers.iter().cloned().collect(),
            future: future.clone(),
        });
        future
    }

    fn find_covering_batch(&self, identifier: &str, locale: &str) -> Option<SharedBatch> {
        self.inflight_batches
            .lock()
            .unwrap()
            .iter()
            .find(|batch| batch.locale == locale && batch.identifiers.contains(identifier))
            .map(|batch| batch.future.clone())
    }

    fn find_overlapping_batch(&self, identifiers: &[String], locale: &str) -> Option<SharedBatch> {
        self.inflight_batches
            .lock()
            .unwrap()
            .iter()
            .find(|batch| {
                batch.locale == locale
                    && identifiers.iter().any(|id| batch.identifiers.contains(id))
            })
            .map(|batch| batch.future.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::storage::CacheEntry;
    use crate::error::Result;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration as StdDuration;

    struct NullStore;

    impl Store for NullStore {
        fn load_canonical(&self, _id: u64) -> Result<Option<GameRecord>> {
            Ok(None)
        }
        fn save_canonical(&self, _record: &GameRecord) -> Result<()> {
            Ok(())
        }
        fn load_cache_entry(&self, _key: &CacheKey) -> Result<Option<CacheEntry>> {
            Ok(None)
        }
        fn save_cache_entry(
            &self,
            _key: &CacheKey,
            _payload: &GameRecord,
            _ttl: Duration,
        ) -> Result<()> {
            Ok(())
        }
        fn top_rated(&self, _limit: usize) -> Result<Vec<GameRecord>> {
            Ok(Vec::new())
        }
        fn purge_expired(&self) -> Result<usize> {
            Ok(0)
        }
    }

    /// Slow mock resolver that counts how many requests actually reach it.
    struct MockSource {
        single_calls: AtomicUsize,
        batch_calls: AtomicUsize,
        known: HashSet<String>,
    }

    impl MockSource {
        fn with_known(ids: &[&str]) -> Self {
            Self {
                single_calls: AtomicUsize::new(0),
                batch_calls: AtomicUsize::new(0),
                known: ids.iter().map(|s| s.to_string()).collect(),
            }
        }

        fn record_for(&self, identifier: &str) -> Option<GameRecord> {
            self.known.contains(identifier).then(|| {
                let id = identifier.parse().unwrap_or(1);
                GameRecord::new(id, format!("game-{identifier}"), format!("Game {identifier}"))
            })
        }
    }

    #[async_trait]
    impl GameSource for MockSource {
        async fn fetch_game(&self, identifier: &str, _locale: &str) -> Result<Option<GameRecord>> {
            self.single_calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(StdDuration::from_millis(30)).await;
            Ok(self.record_for(identifier))
        }

        async fn fetch_games(
            &self,
            identifiers: &[String],
            _locale: &str,
        ) -> Result<HashMap<String, Option<GameRecord>>> {
            self.batch_calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(StdDuration::from_millis(30)).await;
            Ok(identifiers
                .iter()
                .map(|id| (id.clone(), self.record_for(id)))
                .collect())
        }
    }

    fn cache_with(source: Arc<MockSource>) -> Arc<GameDataCache> {
        Arc::new(GameDataCache::new(source, Arc::new(NullStore)))
    }

    #[tokio::test]
    async fn concurrent_gets_share_one_request() {
        let source = Arc::new(MockSource::with_known(&["42"]));
        let cache = cache_with(Arc::clone(&source));

        let lookups = (0..10).map(|_| {
            let cache = Arc::clone(&cache);
            async move { cache.get_game("42", "en").await }
        });
        let results = futures::future::join_all(lookups).await;

        assert_eq!(source.single_calls.load(Ordering::SeqCst), 1);
        for result in results {
            assert_eq!(result.as_ref().map(|r| r.id), Some(42));
        }

        // Settled requests are deregistered and the result is now cached.
        assert!(cache.inflight_single.lock().unwrap().is_empty());
        assert!(cache.get_game("42", "en").await.is_some());
        assert_eq!(source.single_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn not_found_is_shared_but_not_cached() {
        let source = Arc::new(MockSource::with_known(&[]));
        let cache = cache_with(Arc::clone(&source));

        let (a, b) = tokio::join!(cache.get_game("7", "en"), cache.get_game("7", "en"));
        assert!(a.is_none());
        assert!(b.is_none());
        assert_eq!(source.single_calls.load(Ordering::SeqCst), 1);

        // Absent results are not stored; the next read asks again.
        assert!(cache.get_game("7", "en").await.is_none());
        assert_eq!(source.single_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn batch_output_covers_every_input_once() {
        let source = Arc::new(MockSource::with_known(&["1", "2"]));
        let cache = cache_with(Arc::clone(&source));

        let input = vec!["1".to_string(), "1".to_string(), "2".to_string(), "9".to_string()];
        let results = cache.get_games(&input, "en").await;

        assert_eq!(results.len(), 3);
        assert!(results["1"].is_some());
        assert!(results["2"].is_some());
        assert!(results["9"].is_none());
        assert_eq!(source.batch_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn single_lookup_adopts_inflight_batch() {
        let source = Arc::new(MockSource::with_known(&["5", "6"]));
        let cache = cache_with(Arc::clone(&source));

        let batch_cache = Arc::clone(&cache);
        let batch = tokio::spawn(async move {
            batch_cache
                .get_games(&["5".to_string(), "6".to_string()], "en")
                .await
        });
        // Let the batch register before the single lookup lands.
        tokio::time::sleep(StdDuration::from_millis(5)).await;

        let single = cache.get_game("5", "en").await;
        assert_eq!(single.map(|r| r.id), Some(5));
        assert_eq!(source.single_calls.load(Ordering::SeqCst), 0);
        assert_eq!(source.batch_calls.load(Ordering::SeqCst), 1);

        let batch_results = batch.await.unwrap();
        assert_eq!(batch_results.len(), 2);
    }

    #[tokio::test]
    async fn batch_results_serve_later_single_lookups() {
        let source = Arc::new(MockSource::with_known(&["11", "12"]));
        let cache = cache_with(Arc::clone(&source));

        cache
            .get_games(&["11".to_string(), "12".to_string()], "en")
            .await;
        assert!(cache.get_game("11", "en").await.is_some());
        assert_eq!(source.single_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn locales_do_not_share_entries() {
        let source = Arc::new(MockSource::with_known(&["3"]));
        let cache = cache_with(Arc::clone(&source));

        cache.get_game("3", "en").await;
        cache.get_game("3", "fr").await;
        assert_eq!(source.single_calls.load(Ordering::SeqCst), 2);
    }
}
