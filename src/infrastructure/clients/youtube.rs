use crate::domain::{ClipCandidate, VideoSource};
use crate::error::Result;
use reqwest::Client;
use serde::Deserialize;
use tracing::{error, info};

const SEARCH_URL: &str = "https://www.googleapis.com/youtube/v3/search";
const MAX_RESULTS: usize = 5;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: VideoId,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
struct VideoId {
    #[serde(rename = "videoId", default)]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    title: String,
    #[serde(default)]
    thumbnails: Option<Thumbnails>,
}

#[derive(Debug, Deserialize)]
struct Thumbnails {
    #[serde(default)]
    high: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

/// Last-resort video search for games whose catalog provider ships no
/// playable clips at all.
pub struct YoutubeClient {
    client: Client,
    api_key: Option<String>,
}

impl YoutubeClient {
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        if api_key.is_none() {
            info!("No video-search API key configured, media fallback disabled");
        }
        Self { client, api_key }
    }

    /// Embeddable-only keyword search, relevance order, capped at 5.
    pub async fn search_clips(&self, game_name: &str) -> Result<Vec<ClipCandidate>> {
        let Some(key) = self.api_key.as_deref() else {
            return Ok(Vec::new());
        };

        let query = format!("{game_name} official trailer");
        let max_results = MAX_RESULTS.to_string();
        let response = self
            .client
            .get(SEARCH_URL)
            .query(&[
                ("part", "snippet"),
                ("q", query.as_str()),
                ("type", "video"),
                ("videoEmbeddable", "true"),
                ("maxResults", max_results.as_str()),
                ("key", key),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            error!("Video search error for {game_name}: Status {}", response.status());
            return Ok(Vec::new());
        }

        let search: SearchResponse = response.json().await?;
        Ok(search
            .items
            .into_iter()
            .filter_map(|item| {
                let video_id = item.id.video_id?;
                Some(ClipCandidate {
                    title: item.snippet.title,
                    url: format!("https://www.youtube.com/watch?v={video_id}"),
                    preview: item.snippet.thumbnails.and_then(|t| t.high).map(|t| t.url),
                    source: VideoSource::Search,
                })
            })
            .take(MAX_RESULTS)
            .collect())
    }
}
