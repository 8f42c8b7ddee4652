use crate::domain::{ClipCandidate, GameRecord, NamedSlug, StorefrontLink, VideoSource};
use crate::error::Result;
use once_cell::sync::OnceCell;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{error, info};

const BASE_URL: &str = "https://api.rawg.io/api";

#[derive(Debug, Deserialize)]
struct RawgSearchResponse {
    results: Vec<RawgGame>,
}

#[derive(Debug, Deserialize)]
struct RawgNamed {
    name: String,
    #[serde(default)]
    slug: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawgPlatform {
    platform: RawgNamed,
}

/// Raw detail/list payload. List items carry a subset of the detail fields,
/// so everything beyond the identity triple is optional.
#[derive(Debug, Deserialize)]
struct RawgGame {
    id: u64,
    slug: String,
    name: String,
    #[serde(default)]
    description_raw: Option<String>,
    #[serde(default)]
    metacritic: Option<Value>,
    #[serde(default)]
    released: Option<String>,
    #[serde(default)]
    tba: Option<bool>,
    #[serde(default)]
    background_image: Option<String>,
    #[serde(default)]
    rating: Option<f64>,
    #[serde(default)]
    playtime: Option<u32>,
    #[serde(default)]
    genres: Option<Vec<RawgNamed>>,
    #[serde(default)]
    tags: Option<Vec<RawgNamed>>,
    #[serde(default)]
    platforms: Option<Vec<RawgPlatform>>,
    #[serde(default)]
    developers: Option<Vec<RawgNamed>>,
    #[serde(default)]
    publishers: Option<Vec<RawgNamed>>,
}

#[derive(Debug, Deserialize)]
struct RawgScreenshotsResponse {
    results: Vec<RawgScreenshot>,
}

#[derive(Debug, Deserialize)]
struct RawgScreenshot {
    image: String,
}

#[derive(Debug, Deserialize)]
struct RawgMoviesResponse {
    results: Vec<RawgMovie>,
}

#[derive(Debug, Deserialize)]
struct RawgMovie {
    name: String,
    #[serde(default)]
    preview: Option<String>,
    #[serde(default)]
    data: Option<HashMap<String, String>>,
}

#[derive(Debug, Deserialize)]
struct RawgStoresResponse {
    results: Vec<RawgStoreLink>,
}

#[derive(Debug, Deserialize)]
struct RawgStoreLink {
    store_id: u64,
    #[serde(default)]
    url: Option<String>,
}

fn store_name(store_id: u64) -> Option<(&'static str, &'static str)> {
    static STORES: OnceCell<HashMap<u64, (&'static str, &'static str)>> = OnceCell::new();
    STORES
        .get_or_init(|| {
            HashMap::from([
                (1, ("Steam", "store.steampowered.com")),
                (2, ("Xbox Store", "www.xbox.com")),
                (3, ("PlayStation Store", "store.playstation.com")),
                (4, ("App Store", "apps.apple.com")),
                (5, ("GOG", "www.gog.com")),
                (6, ("Nintendo Store", "www.nintendo.com")),
                (8, ("Google Play", "play.google.com")),
                (9, ("itch.io", "itch.io")),
                (11, ("Epic Games", "store.epicgames.com")),
            ])
        })
        .get(&store_id)
        .copied()
}

/// The catalog provider uses a string sentinel for unrated titles; normalize
/// it away so nothing downstream sees a raw shape.
fn numeric_score(value: &Option<Value>) -> Option<u32> {
    match value {
        Some(Value::Number(n)) => n.as_u64().map(|v| v as u32),
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    }
}

impl RawgGame {
    fn into_record(self) -> GameRecord {
        let named = |items: Option<Vec<RawgNamed>>| -> Vec<NamedSlug> {
            items
                .unwrap_or_default()
                .into_iter()
                .map(|n| NamedSlug {
                    slug: n.slug.unwrap_or_else(|| n.name.to_lowercase()),
                    name: n.name,
                })
                .collect()
        };

        let mut record = GameRecord::new(self.id, self.slug, self.name);
        record.released = self.released;
        record.tba = self.tba.unwrap_or(false);
        record.cover_image = self.background_image.clone();
        record.background_image = self.background_image;
        record.metacritic = numeric_score(&self.metacritic);
        record.community_rating = self.rating.filter(|r| *r > 0.0);
        record.playtime_hours = self.playtime.filter(|p| *p > 0);
        record.description = self
            .description_raw
            .filter(|d| !d.trim().is_empty());
        // Catalog descriptions are English regardless of requested locale.
        record.description_locale = record.description.as_ref().map(|_| "en".to_string());
        record.genres = named(self.genres);
        record.tags = named(self.tags);
        record.platforms = named(
            self.platforms
                .map(|ps| ps.into_iter().map(|p| p.platform).collect()),
        );
        record.developers = named(self.developers).into_iter().map(|n| n.name).collect();
        record.publishers = named(self.publishers).into_iter().map(|n| n.name).collect();
        record
    }
}

pub struct RawgClient {
    client: Client,
    api_key: Option<String>,
}

impl RawgClient {
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        if api_key.is_none() {
            info!("No RAWG API key configured, catalog provider disabled");
        }
        Self { client, api_key }
    }

    fn key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Detail lookup by numeric id or slug. Missing games and provider
    /// errors both come back as `None`; the caller decides what that means.
    pub async fn get_game(&self, id_or_slug: &str) -> Result<Option<GameRecord>> {
        let Some(key) = self.key() else {
            return Ok(None);
        };

        let url = format!("{BASE_URL}/games/{id_or_slug}");
        let response = self.client.get(&url).query(&[("key", key)]).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            info!("No RAWG record for {id_or_slug}");
            return Ok(None);
        }
        if !response.status().is_success() {
            error!("RAWG API error for {id_or_slug}: Status {}", response.status());
            return Ok(None);
        }

        let game: RawgGame = response.json().await?;
        Ok(Some(game.into_record()))
    }

    /// Name search, used to grade ambiguous slug lookups.
    pub async fn search(&self, query: &str, page_size: usize) -> Result<Vec<GameRecord>> {
        let Some(key) = self.key() else {
            return Ok(Vec::new());
        };

        let page_size = page_size.to_string();
        let response = self
            .client
            .get(format!("{BASE_URL}/games"))
            .query(&[
                ("key", key),
                ("search", query),
                ("page_size", page_size.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            error!("RAWG search error for {query}: Status {}", response.status());
            return Ok(Vec::new());
        }

        let search: RawgSearchResponse = response.json().await?;
        Ok(search.results.into_iter().map(RawgGame::into_record).collect())
    }

    pub async fn get_screenshots(&self, id: u64) -> Result<Vec<String>> {
        let Some(key) = self.key() else {
            return Ok(Vec::new());
        };

        let response = self
            .client
            .get(format!("{BASE_URL}/games/{id}/screenshots"))
            .query(&[("key", key)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Ok(Vec::new());
        }

        let screenshots: RawgScreenshotsResponse = response.json().await?;
        Ok(screenshots.results.into_iter().map(|s| s.image).collect())
    }

    pub async fn get_movies(&self, id: u64) -> Result<Vec<ClipCandidate>> {
        let Some(key) = self.key() else {
            return Ok(Vec::new());
        };

        let response = self
            .client
            .get(format!("{BASE_URL}/games/{id}/movies"))
            .query(&[("key", key)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Ok(Vec::new());
        }

        let movies: RawgMoviesResponse = response.json().await?;
        Ok(movies
            .results
            .into_iter()
            .filter_map(|movie| {
                let data = movie.data?;
                let url = data
                    .get("max")
                    .or_else(|| data.get("480"))
                    .cloned()?;
                Some(ClipCandidate {
                    title: movie.name,
                    url,
                    preview: movie.preview,
                    source: VideoSource::Provider,
                })
            })
            .collect())
    }

    pub async fn get_stores(&self, id: u64) -> Result<Vec<StorefrontLink>> {
        let Some(key) = self.key() else {
            return Ok(Vec::new());
        };

        let response = self
            .client
            .get(format!("{BASE_URL}/games/{id}/stores"))
            .query(&[("key", key)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Ok(Vec::new());
        }

        let stores: RawgStoresResponse = response.json().await?;
        Ok(stores
            .results
            .into_iter()
            .filter_map(|link| {
                let (name, domain) = store_name(link.store_id)?;
                let url = match link.url.filter(|u| !u.is_empty()) {
                    Some(deep) => deep,
                    // The provider omits the URL for some listings; fall back
                    // to the store homepage.
                    None => format!("https://{domain}"),
                };
                Some(StorefrontLink {
                    store: name.to_string(),
                    url,
                })
            })
            .collect())
    }

    pub async fn top_rated(&self, limit: usize) -> Result<Vec<GameRecord>> {
        let Some(key) = self.key() else {
            return Ok(Vec::new());
        };

        let page_size = limit.to_string();
        let response = self
            .client
            .get(format!("{BASE_URL}/games"))
            .query(&[
                ("key", key),
                ("ordering", "-metacritic"),
                ("metacritic", "60,100"),
                ("page_size", page_size.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            error!("RAWG top-rated error: Status {}", response.status());
            return Ok(Vec::new());
        }

        let search: RawgSearchResponse = response.json().await?;
        Ok(search.results.into_iter().map(RawgGame::into_record).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metacritic_sentinel_normalizes_to_none() {
        assert_eq!(numeric_score(&Some(Value::from(87))), Some(87));
        assert_eq!(numeric_score(&Some(Value::from("unknown"))), None);
        assert_eq!(numeric_score(&Some(Value::from("91"))), Some(91));
        assert_eq!(numeric_score(&None), None);
    }

    #[test]
    fn raw_payload_normalizes_to_record() {
        let raw: RawgGame = serde_json::from_value(serde_json::json!({
            "id": 3498,
            "slug": "grand-theft-auto-v",
            "name": "Grand Theft Auto V",
            "metacritic": "unknown",
            "released": "2013-09-17",
            "rating": 4.47,
            "playtime": 74,
            "genres": [{"name": "Action", "slug": "action"}],
            "platforms": [{"platform": {"name": "PC", "slug": "pc"}}],
            "developers": [{"name": "Rockstar North", "slug": "rockstar-north"}]
        }))
        .unwrap();

        let record = raw.into_record();
        assert_eq!(record.id, 3498);
        assert_eq!(record.metacritic, None);
        assert_eq!(record.community_rating, Some(4.47));
        assert_eq!(record.playtime_hours, Some(74));
        assert_eq!(record.genres[0].slug, "action");
        assert_eq!(record.platforms[0].name, "PC");
        assert_eq!(record.developers, vec!["Rockstar North".to_string()]);
    }

    #[test]
    fn unknown_store_ids_are_dropped() {
        assert!(store_name(1).is_some());
        assert!(store_name(999).is_none());
    }
}
