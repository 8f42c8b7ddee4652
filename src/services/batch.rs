use crate::domain::source::GameSource;
use crate::domain::GameRecord;
use crate::error::Result;
use crate::services::resolver::{GameResolver, ResolveDepth};
use async_trait::async_trait;
use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::warn;

/// How many resolutions run concurrently within a chunk.
const BATCH_CONCURRENCY: usize = 6;

/// Fans a list of identifiers out over the single-item resolver with a
/// bounded concurrency pool. Chunks run sequentially in input order;
/// completion order within a chunk is unordered, so results are keyed by
/// identifier.
pub struct BatchResolver {
    resolver: Arc<GameResolver>,
    concurrency: usize,
}

impl BatchResolver {
    pub fn new(resolver: Arc<GameResolver>) -> Self {
        Self {
            resolver,
            concurrency: BATCH_CONCURRENCY,
        }
    }

    /// Every distinct input identifier gets exactly one entry in the output
    /// map; failures and not-found both land as `None`.
    pub async fn resolve_all(
        &self,
        identifiers: &[String],
        locale: &str,
    ) -> HashMap<String, Option<GameRecord>> {
        let unique = dedupe(identifiers);

        let mut results = HashMap::with_capacity(unique.len());
        for chunk in unique.chunks(self.concurrency) {
            let fetches = chunk.iter().map(|identifier| async move {
                let outcome = self
                    .resolver
                    .resolve(identifier, locale, ResolveDepth::Minimal)
                    .await;
                (identifier.clone(), outcome)
            });
            for (identifier, outcome) in join_all(fetches).await {
                let record = match outcome {
                    Ok(record) => record,
                    Err(e) => {
                        warn!("Batch resolution failed for {identifier}: {e}");
                        None
                    }
                };
                results.insert(identifier, record);
            }
        }
        results
    }
}

#[async_trait]
impl GameSource for BatchResolver {
    async fn fetch_game(&self, identifier: &str, locale: &str) -> Result<Option<GameRecord>> {
        self.resolver
            .resolve(identifier, locale, ResolveDepth::Full)
            .await
    }

    async fn fetch_games(
        &self,
        identifiers: &[String],
        locale: &str,
    ) -> Result<HashMap<String, Option<GameRecord>>> {
        Ok(self.resolve_all(identifiers, locale).await)
    }
}

fn dedupe(identifiers: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    identifiers
        .iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedupe_preserves_first_seen_order() {
        let input = vec![
            "1".to_string(),
            "1".to_string(),
            "2".to_string(),
            "1".to_string(),
            "3".to_string(),
        ];
        assert_eq!(dedupe(&input), vec!["1", "2", "3"]);
    }
}
