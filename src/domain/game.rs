use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub const SCREENSHOT_CAP: usize = 6;
pub const TRAILER_CAP: usize = 5;
pub const GAMEPLAY_CAP: usize = 2;

/// Primary freshness window for canonical records.
pub const CANONICAL_TTL_DAYS: i64 = 7;
/// Shorter window applied once a media enrichment pass has been forced.
pub const ENRICHED_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedSlug {
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoSource {
    Provider,
    Search,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameVideo {
    pub title: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    pub source: VideoSource,
    pub score: i32,
}

/// A playable clip as delivered by a provider, before classification.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipCandidate {
    pub title: String,
    pub url: String,
    pub preview: Option<String>,
    pub source: VideoSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorefrontLink {
    pub store: String,
    pub url: String,
}

impl StorefrontLink {
    /// A deep link points at a concrete product page rather than a store
    /// homepage.
    pub fn is_deep(&self) -> bool {
        self.url
            .splitn(4, '/')
            .nth(3)
            .map(|path| !path.trim_matches('/').is_empty())
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PcRequirements {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended: Option<String>,
}

impl PcRequirements {
    pub fn is_empty(&self) -> bool {
        self.minimum.is_none() && self.recommended.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRecord {
    pub id: u64,
    pub slug: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub released: Option<String>,
    #[serde(default)]
    pub tba: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metacritic: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub community_rating: Option<f64>,
    #[serde(default)]
    pub genres: Vec<NamedSlug>,
    #[serde(default)]
    pub tags: Vec<NamedSlug>,
    #[serde(default)]
    pub platforms: Vec<NamedSlug>,
    #[serde(default)]
    pub developers: Vec<String>,
    #[serde(default)]
    pub publishers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playtime_hours: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Locale of `description`, tracked so localization passes stay
    /// idempotent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_locale: Option<String>,
    #[serde(default)]
    pub screenshots: Vec<String>,
    #[serde(default)]
    pub trailers: Vec<GameVideo>,
    #[serde(default)]
    pub gameplay_clips: Vec<GameVideo>,
    #[serde(default)]
    pub storefront_links: Vec<StorefrontLink>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pc_requirements: Option<PcRequirements>,
    pub last_refreshed_at: DateTime<Utc>,
}

impl GameRecord {
    pub fn new(id: u64, slug: String, name: String) -> Self {
        Self {
            id,
            slug,
            name,
            released: None,
            tba: false,
            cover_image: None,
            background_image: None,
            metacritic: None,
            community_rating: None,
            genres: Vec::new(),
            tags: Vec::new(),
            platforms: Vec::new(),
            developers: Vec::new(),
            publishers: Vec::new(),
            playtime_hours: None,
            description: None,
            description_locale: None,
            screenshots: Vec::new(),
            trailers: Vec::new(),
            gameplay_clips: Vec::new(),
            storefront_links: Vec::new(),
            pc_requirements: None,
            last_refreshed_at: Utc::now(),
        }
    }

    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now - self.last_refreshed_at < Duration::days(CANONICAL_TTL_DAYS)
    }

    /// Zero screenshots, or no trailer and no gameplay clip.
    pub fn has_media_gap(&self) -> bool {
        self.screenshots.is_empty() || (self.trailers.is_empty() && self.gameplay_clips.is_empty())
    }

    pub fn has_storefront_gap(&self) -> bool {
        self.storefront_links.is_empty()
    }

    /// Secondary staleness: missing enrichment fields override the primary
    /// TTL on the read path.
    pub fn needs_enrichment(&self) -> bool {
        self.has_media_gap() || self.has_storefront_gap()
    }

    /// Fill gaps from another normalized record. A field that is already
    /// populated is never overwritten, so merging absent provider data is a
    /// no-op.
    pub fn with_record(mut self, other: &GameRecord) -> Self {
        if self.released.is_none() {
            self.released = other.released.clone();
        }
        if !self.tba {
            self.tba = other.tba;
        }
        if self.cover_image.is_none() {
            self.cover_image = other.cover_image.clone();
        }
        if self.background_image.is_none() {
            self.background_image = other.background_image.clone();
        }
        if self.metacritic.is_none() {
            self.metacritic = other.metacritic;
        }
        if self.community_rating.is_none() {
            self.community_rating = other.community_rating;
        }
        if self.genres.is_empty() {
            self.genres = other.genres.clone();
        }
        if self.tags.is_empty() {
            self.tags = other.tags.clone();
        }
        if self.platforms.is_empty() {
            self.platforms = other.platforms.clone();
        }
        if self.developers.is_empty() {
            self.developers = other.developers.clone();
        }
        if self.publishers.is_empty() {
            self.publishers = other.publishers.clone();
        }
        if self.playtime_hours.is_none() {
            self.playtime_hours = other.playtime_hours;
        }
        if self.description.is_none() {
            self.description = other.description.clone();
            self.description_locale = other.description_locale.clone();
        }
        if self.screenshots.is_empty() {
            self.screenshots = other.screenshots.clone();
        }
        if self.trailers.is_empty() {
            self.trailers = other.trailers.clone();
        }
        if self.gameplay_clips.is_empty() {
            self.gameplay_clips = other.gameplay_clips.clone();
        }
        for link in &other.storefront_links {
            self.push_storefront(link.clone());
        }
        if self
            .pc_requirements
            .as_ref()
            .map(|r| r.is_empty())
            .unwrap_or(true)
        {
            if let Some(reqs) = &other.pc_requirements {
                if !reqs.is_empty() {
                    self.pc_requirements = Some(reqs.clone());
                }
            }
        }
        self
    }

    /// Add a storefront link, reporting whether anything changed. An
    /// existing deep link for the same store is kept; a generic homepage
    /// link is upgraded when a deep link arrives.
    pub fn push_storefront(&mut self, link: StorefrontLink) -> bool {
        if link.url.is_empty() {
            return false;
        }
        match self
            .storefront_links
            .iter_mut()
            .find(|l| l.store.eq_ignore_ascii_case(&link.store))
        {
            Some(existing) => {
                if !existing.is_deep() && link.is_deep() {
                    *existing = link;
                    true
                } else {
                    false
                }
            }
            None => {
                self.storefront_links.push(link);
                true
            }
        }
    }

    pub fn set_screenshots(&mut self, urls: Vec<String>) {
        self.screenshots = urls.into_iter().take(SCREENSHOT_CAP).collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_record() -> GameRecord {
        GameRecord::new(3498, "grand-theft-auto-v".into(), "Grand Theft Auto V".into())
    }

    #[test]
    fn fresh_record_within_primary_window() {
        let mut record = base_record();
        record.last_refreshed_at = Utc::now() - Duration::days(CANONICAL_TTL_DAYS - 1);
        assert!(record.is_fresh(Utc::now()));

        record.last_refreshed_at = Utc::now() - Duration::days(CANONICAL_TTL_DAYS);
        assert!(!record.is_fresh(Utc::now()));
    }

    #[test]
    fn media_gap_requires_screenshots_and_a_clip() {
        let mut record = base_record();
        assert!(record.has_media_gap());

        record.screenshots = vec!["https://example.com/shot.jpg".into()];
        assert!(record.has_media_gap());

        record.gameplay_clips.push(GameVideo {
            title: "Gameplay".into(),
            url: "https://example.com/clip.mp4".into(),
            preview: None,
            source: VideoSource::Provider,
            score: 0,
        });
        assert!(!record.has_media_gap());
    }

    #[test]
    fn merge_never_overwrites_populated_fields_with_emptiness() {
        let mut populated = base_record();
        populated.metacritic = Some(96);
        populated.description = Some("A sprawling open world.".into());
        populated.screenshots = vec!["https://example.com/a.jpg".into()];

        let empty = base_record();
        let merged = populated.clone().with_record(&empty);

        assert_eq!(merged.metacritic, Some(96));
        assert_eq!(merged.description.as_deref(), Some("A sprawling open world."));
        assert_eq!(merged.screenshots, populated.screenshots);
    }

    #[test]
    fn merge_fills_gaps_from_the_other_record() {
        let sparse = base_record();
        let mut full = base_record();
        full.released = Some("2013-09-17".into());
        full.metacritic = Some(96);
        full.developers = vec!["Rockstar North".into()];

        let merged = sparse.with_record(&full);
        assert_eq!(merged.released.as_deref(), Some("2013-09-17"));
        assert_eq!(merged.metacritic, Some(96));
        assert_eq!(merged.developers, vec!["Rockstar North".to_string()]);
    }

    #[test]
    fn deep_storefront_link_replaces_generic_homepage() {
        let mut record = base_record();
        record.push_storefront(StorefrontLink {
            store: "Steam".into(),
            url: "https://store.steampowered.com".into(),
        });
        record.push_storefront(StorefrontLink {
            store: "Steam".into(),
            url: "https://store.steampowered.com/app/271590".into(),
        });

        assert_eq!(record.storefront_links.len(), 1);
        assert_eq!(
            record.storefront_links[0].url,
            "https://store.steampowered.com/app/271590"
        );

        // A later generic link must not downgrade the deep one.
        record.push_storefront(StorefrontLink {
            store: "Steam".into(),
            url: "https://store.steampowered.com".into(),
        });
        assert!(record.storefront_links[0].is_deep());
    }

    #[test]
    fn screenshots_are_capped() {
        let mut record = base_record();
        let urls: Vec<String> = (0..10).map(|i| format!("https://example.com/{i}.jpg")).collect();
        record.set_screenshots(urls);
        assert_eq!(record.screenshots.len(), SCREENSHOT_CAP);
    }
}
