use crate::domain::storage::Store;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Periodic expired-entry sweep over the cache table. Runs independently of
/// the read path; a failed sweep never affects request serving.
pub struct CacheSweeper {
    store: Arc<dyn Store>,
}

impl CacheSweeper {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub fn run_once(&self) {
        match self.store.purge_expired() {
            Ok(0) => debug!("Cache sweep found nothing to purge"),
            Ok(purged) => info!("Purged {purged} expired cache entries"),
            Err(e) => warn!("Cache sweep failed: {e}"),
        }
    }

    pub async fn run(&self, every: Duration) {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            self.run_once();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::storage::CacheKey;
    use crate::domain::GameRecord;
    use crate::infrastructure::FileSystemStore;
    use tempfile::TempDir;

    #[test]
    fn sweep_clears_expired_entries() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(FileSystemStore::new(
            dir.path().join("data"),
            dir.path().join("cache"),
        ));
        let record = GameRecord::new(1, "one".into(), "One".into());
        store
            .save_cache_entry(&CacheKey::new("one", "en"), &record, chrono::Duration::seconds(-1))
            .unwrap();

        CacheSweeper::new(store.clone()).run_once();
        assert!(store
            .load_cache_entry(&CacheKey::new("one", "en"))
            .unwrap()
            .is_none());
    }
}
