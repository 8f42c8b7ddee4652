use crate::domain::GameRecord;
use crate::error::GameDataError;
use crate::services::discovery::{DiscoveryService, DiscoveryStats};
use crate::services::game_cache::GameDataCache;
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;

#[derive(Debug, Serialize)]
pub struct GameResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game: Option<GameRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GamesResponse {
    pub ok: bool,
    pub games: HashMap<String, Option<GameRecord>>,
}

#[derive(Debug, Serialize)]
pub struct DiscoveryResponse {
    pub ok: bool,
    pub top_rated: Vec<GameRecord>,
    pub stats: DiscoveryStats,
}

/// Facade over the cache and discovery services producing the response
/// envelopes consumed by the front end. Not-found is the only failure the
/// caller sees; everything else has already degraded to partial data.
pub struct GameDataService {
    cache: GameDataCache,
    discovery: DiscoveryService,
}

impl GameDataService {
    pub fn new(cache: GameDataCache, discovery: DiscoveryService) -> Self {
        info!("Created new game data service");
        Self { cache, discovery }
    }

    pub async fn fetch_game(&self, identifier: &str, locale: &str) -> GameResponse {
        match self.cache.get_game(identifier, locale).await {
            Some(game) => GameResponse {
                ok: true,
                game: Some(game),
                error: None,
            },
            None => GameResponse {
                ok: false,
                game: None,
                error: Some(GameDataError::NotFound(identifier.to_string()).to_string()),
            },
        }
    }

    pub async fn fetch_games(&self, identifiers: &[String], locale: &str) -> GamesResponse {
        GamesResponse {
            ok: true,
            games: self.cache.get_games(identifiers, locale).await,
        }
    }

    pub async fn discovery_catalog(&self, limit: usize) -> DiscoveryResponse {
        let catalog = self.discovery.top_rated(limit).await;
        DiscoveryResponse {
            ok: true,
            top_rated: catalog.top_rated,
            stats: catalog.stats,
        }
    }
}
