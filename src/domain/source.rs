use crate::domain::GameRecord;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Resolution seam between the client-side cache and the resolver stack.
/// `fetch_games` must return exactly one entry per distinct input
/// identifier, with `None` standing for "resolved to absent".
#[async_trait]
pub trait GameSource: Send + Sync {
    async fn fetch_game(&self, identifier: &str, locale: &str) -> Result<Option<GameRecord>>;
    async fn fetch_games(
        &self,
        identifiers: &[String],
        locale: &str,
    ) -> Result<HashMap<String, Option<GameRecord>>>;
}
