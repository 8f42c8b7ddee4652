use crate::domain::storage::{CacheKey, Store};
use crate::domain::{
    GameRecord, GameVideo, CANONICAL_TTL_DAYS, ENRICHED_TTL_HOURS, StorefrontLink, TRAILER_CAP,
};
use crate::infrastructure::{
    appid_from_url, RawgClient, SteamClient, SteamStorefront, Translator, YoutubeClient,
};
use crate::services::scoring::{classify_clips, score_clip_title};
use crate::services::text_utils::sanitize_requirements;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{info, warn};

/// Detects and fills gap categories (media, storefronts, locale text) so
/// records fetched cheaply can be upgraded without a full re-fetch. Every
/// sub-step absorbs its own failures; enrichment never fails a resolution.
pub struct Enrichment {
    rawg: Arc<RawgClient>,
    steam: Arc<SteamClient>,
    youtube: Arc<YoutubeClient>,
    translator: Translator,
    store: Arc<dyn Store>,
}

impl Enrichment {
    pub fn new(
        rawg: Arc<RawgClient>,
        steam: Arc<SteamClient>,
        youtube: Arc<YoutubeClient>,
        translator: Translator,
        store: Arc<dyn Store>,
    ) -> Self {
        Self {
            rawg,
            steam,
            youtube,
            translator,
            store,
        }
    }

    /// Run every applicable gap fill on `record` and write the result back
    /// to both stores when anything changed. Returns whether the record was
    /// modified. Running this twice in a row is a no-op: each fill is gated
    /// on its own detection rule.
    pub async fn enrich(&self, record: &mut GameRecord, locale: &str, keys: &[CacheKey]) -> bool {
        let media_filled = if record.has_media_gap() {
            self.fill_media_gap(record).await
        } else {
            false
        };

        let mut changed = media_filled;
        if record.has_storefront_gap() {
            changed |= self.fill_storefront_links(record).await;
        }
        changed |= self.fill_locale_text(record, locale).await;

        if changed {
            record.last_refreshed_at = Utc::now();
            // Forced media enrichment shortens the freshness window.
            let ttl = if media_filled {
                Duration::hours(ENRICHED_TTL_HOURS)
            } else {
                Duration::days(CANONICAL_TTL_DAYS)
            };
            self.write_back(record, keys, ttl);
        }
        changed
    }

    async fn fill_media_gap(&self, record: &mut GameRecord) -> bool {
        let mut filled = false;

        if record.screenshots.is_empty() {
            match self.rawg.get_screenshots(record.id).await {
                Ok(shots) if !shots.is_empty() => {
                    record.set_screenshots(shots);
                    filled = true;
                }
                // Genuinely absent upstream is terminal, not retryable.
                Ok(_) => info!("No screenshots upstream for {}", record.slug),
                Err(e) => warn!("Screenshot fetch failed for {}: {e}", record.slug),
            }
        }

        if record.trailers.is_empty() && record.gameplay_clips.is_empty() {
            let candidates = match self.rawg.get_movies(record.id).await {
                Ok(clips) => clips,
                Err(e) => {
                    warn!("Movie fetch failed for {}: {e}", record.slug);
                    Vec::new()
                }
            };

            if candidates.is_empty() {
                // Provider ships no playable clips at all; last-resort
                // keyword search, relevance order, no classification.
                match self.youtube.search_clips(&record.name).await {
                    Ok(clips) if !clips.is_empty() => {
                        record.trailers = clips
                            .into_iter()
                            .take(TRAILER_CAP)
                            .map(|clip| GameVideo {
                                score: score_clip_title(&clip.title),
                                title: clip.title,
                                url: clip.url,
                                preview: clip.preview,
                                source: clip.source,
                            })
                            .collect();
                        filled = true;
                    }
                    Ok(_) => {}
                    Err(e) => warn!("Video search failed for {}: {e}", record.slug),
                }
            } else {
                let (trailers, gameplay) = classify_clips(candidates);
                if !trailers.is_empty() || !gameplay.is_empty() {
                    record.trailers = trailers;
                    record.gameplay_clips = gameplay;
                    filled = true;
                }
            }
        }

        filled
    }

    async fn fill_storefront_links(&self, record: &mut GameRecord) -> bool {
        match self.rawg.get_stores(record.id).await {
            Ok(links) if !links.is_empty() => {
                let mut changed = false;
                for link in links {
                    changed |= record.push_storefront(link);
                }
                changed
            }
            Ok(_) => {
                info!("No storefront listings upstream for {}", record.slug);
                false
            }
            Err(e) => {
                warn!("Storefront fetch failed for {}: {e}", record.slug);
                false
            }
        }
    }

    /// Localized description, PC requirement specs, and the storefront's own
    /// metadata, all sourced from the storefront provider; machine
    /// translation only when no native-locale text exists.
    async fn fill_locale_text(&self, record: &mut GameRecord, locale: &str) -> bool {
        let needs_requirements = record
            .pc_requirements
            .as_ref()
            .map(|r| r.is_empty())
            .unwrap_or(true);
        let needs_description = record.description.is_none();
        let needs_locale =
            record.description.is_some() && record.description_locale.as_deref() != Some(locale);
        if !(needs_requirements || needs_description || needs_locale) {
            return false;
        }

        let mut changed = false;
        if let Some(app_id) = steam_app_id(record) {
            match self.steam.get_storefront(app_id, locale).await {
                Ok(Some(storefront)) => {
                    changed |= apply_storefront(record, &storefront, locale);
                }
                Ok(None) => {}
                Err(e) => warn!("Storefront text fetch failed for {}: {e}", record.slug),
            }
        }

        if record.description_locale.as_deref() != Some(locale) {
            if let Some(description) = record.description.clone() {
                match self.translator.translate(&description, locale).await {
                    Ok(Some(translated)) => {
                        record.description = Some(translated);
                        record.description_locale = Some(locale.to_string());
                        changed = true;
                    }
                    // Silent fallback to the original-locale text.
                    Ok(None) => {}
                    Err(e) => info!("Translation failed for {}: {e}", record.slug),
                }
            }
        }

        changed
    }

    fn write_back(&self, record: &GameRecord, keys: &[CacheKey], ttl: Duration) {
        if let Err(e) = self.store.save_canonical(record) {
            warn!("Canonical write-back failed for {}: {e}", record.id);
        }
        for key in keys {
            if let Err(e) = self.store.save_cache_entry(key, record, ttl) {
                warn!("Cache write-back failed for {}: {e}", key.storage_key());
            }
        }
    }
}

fn steam_app_id(record: &GameRecord) -> Option<u64> {
    record
        .storefront_links
        .iter()
        .find(|link| link.store.eq_ignore_ascii_case("steam"))
        .and_then(|link| appid_from_url(&link.url))
}

fn apply_storefront(record: &mut GameRecord, storefront: &SteamStorefront, locale: &str) -> bool {
    let mut changed = false;

    if let Some(description) = &storefront.description {
        let replaces_with_native =
            storefront.localized && record.description_locale.as_deref() != Some(locale);
        if record.description.is_none() || replaces_with_native {
            record.description = Some(description.clone());
            record.description_locale = Some(if storefront.localized || locale == "en" {
                locale.to_string()
            } else {
                "en".to_string()
            });
            changed = true;
        }
    }

    if record.metacritic.is_none() {
        if let Some(score) = storefront.metacritic {
            record.metacritic = Some(score);
            changed = true;
        }
    }
    if record.cover_image.is_none() {
        record.cover_image = storefront.header_image.clone();
        changed |= record.cover_image.is_some();
    }

    changed |= record.push_storefront(StorefrontLink {
        store: "Steam".to_string(),
        url: storefront.store_url.clone(),
    });

    let requirements_missing = record
        .pc_requirements
        .as_ref()
        .map(|r| r.is_empty())
        .unwrap_or(true);
    if requirements_missing {
        if let Some(raw) = &storefront.pc_requirements {
            let clean = sanitize_requirements(raw);
            if !clean.is_empty() {
                record.pc_requirements = Some(clean);
                changed = true;
            }
        }
    }

    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PcRequirements;

    fn storefront(localized: bool) -> SteamStorefront {
        SteamStorefront {
            description: Some("Une description localisée.".into()),
            localized,
            header_image: Some("https://cdn.example.com/header.jpg".into()),
            metacritic: Some(88),
            pc_requirements: Some(PcRequirements {
                minimum: Some("<li>8 GB RAM</li>".into()),
                recommended: None,
            }),
            store_url: "https://store.steampowered.com/app/271590".into(),
        }
    }

    #[test]
    fn storefront_fills_gaps_without_clobbering() {
        let mut record = GameRecord::new(1, "gta-v".into(), "GTA V".into());
        record.metacritic = Some(96);

        assert!(apply_storefront(&mut record, &storefront(false), "en"));
        // Populated metacritic survives; the gap fields land.
        assert_eq!(record.metacritic, Some(96));
        assert_eq!(record.description_locale.as_deref(), Some("en"));
        assert_eq!(record.storefront_links.len(), 1);
        assert_eq!(
            record.pc_requirements.as_ref().unwrap().minimum.as_deref(),
            Some("- 8 GB RAM")
        );
    }

    #[test]
    fn native_locale_text_replaces_default_locale_text() {
        let mut record = GameRecord::new(1, "gta-v".into(), "GTA V".into());
        record.description = Some("An English description.".into());
        record.description_locale = Some("en".into());

        apply_storefront(&mut record, &storefront(true), "fr");
        assert_eq!(record.description.as_deref(), Some("Une description localisée."));
        assert_eq!(record.description_locale.as_deref(), Some("fr"));

        // Re-applying is a no-op for the description.
        let before = record.description.clone();
        apply_storefront(&mut record, &storefront(true), "fr");
        assert_eq!(record.description, before);
    }

    #[test]
    fn steam_app_id_comes_from_the_deep_link() {
        let mut record = GameRecord::new(1, "gta-v".into(), "GTA V".into());
        assert_eq!(steam_app_id(&record), None);

        record.push_storefront(StorefrontLink {
            store: "Steam".into(),
            url: "https://store.steampowered.com/app/271590/GTA_V/".into(),
        });
        assert_eq!(steam_app_id(&record), Some(271590));
    }
}
