use crate::domain::storage::Store;
use crate::domain::GameRecord;
use crate::infrastructure::RawgClient;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Below this many qualifying rows the durable store is considered too
/// sparse to serve discovery from.
const FALLBACK_THRESHOLD: usize = 8;

#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryStats {
    pub db_count: usize,
    pub used_fallback: bool,
    pub final_count: usize,
}

#[derive(Debug, Serialize)]
pub struct DiscoveryCatalog {
    pub top_rated: Vec<GameRecord>,
    pub stats: DiscoveryStats,
}

/// Top-rated catalog: durable store first, provider fallback when the store
/// is too sparse. Fallback results are persisted so the store fills up over
/// time.
pub struct DiscoveryService {
    store: Arc<dyn Store>,
    rawg: Arc<RawgClient>,
}

impl DiscoveryService {
    pub fn new(store: Arc<dyn Store>, rawg: Arc<RawgClient>) -> Self {
        Self { store, rawg }
    }

    pub async fn top_rated(&self, limit: usize) -> DiscoveryCatalog {
        let mut games = match self.store.top_rated(limit) {
            Ok(games) => games,
            Err(e) => {
                warn!("Top-rated store query failed: {e}");
                Vec::new()
            }
        };
        let db_count = games.len();

        if db_count >= FALLBACK_THRESHOLD {
            games.truncate(limit);
            let final_count = games.len();
            return DiscoveryCatalog {
                top_rated: games,
                stats: DiscoveryStats {
                    db_count,
                    used_fallback: false,
                    final_count,
                },
            };
        }

        info!("Only {db_count} qualifying rows in store, falling back to provider");
        let fetched = match self.rawg.top_rated(limit).await {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!("Provider top-rated query failed: {e}");
                Vec::new()
            }
        };
        for game in &fetched {
            if let Err(e) = self.store.save_canonical(game) {
                warn!("Persisting discovery record {} failed: {e}", game.id);
            }
        }

        // Provider results lead; store rows not re-surfaced by the provider
        // fill the remainder.
        let mut combined = fetched;
        for game in games {
            if combined.iter().all(|g| g.id != game.id) {
                combined.push(game);
            }
        }
        combined.truncate(limit);

        let final_count = combined.len();
        DiscoveryCatalog {
            top_rated: combined,
            stats: DiscoveryStats {
                db_count,
                used_fallback: true,
                final_count,
            },
        }
    }
}
