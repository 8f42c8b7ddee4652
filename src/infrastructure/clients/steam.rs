use crate::domain::PcRequirements;
use crate::error::Result;
use once_cell::sync::OnceCell;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::info;

const APPDETAILS_URL: &str = "https://store.steampowered.com/api/appdetails";

#[derive(Debug, Deserialize)]
struct SteamStoreData {
    success: bool,
    #[serde(default)]
    data: Option<SteamStoreDetails>,
}

#[derive(Debug, Deserialize)]
struct SteamStoreDetails {
    #[serde(default)]
    short_description: Option<String>,
    #[serde(default)]
    header_image: Option<String>,
    #[serde(default)]
    metacritic: Option<SteamMetacritic>,
    // Sometimes an object, sometimes an empty array.
    #[serde(default)]
    pc_requirements: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct SteamMetacritic {
    score: u32,
}

/// Storefront data normalized to the canonical record shape. The
/// requirement fields still carry provider HTML fragments; text cleaning is
/// an enrichment concern.
#[derive(Debug, Clone)]
pub struct SteamStorefront {
    pub description: Option<String>,
    /// True when the storefront was queried for a non-default locale, i.e.
    /// the text is a native-locale source rather than a translation target.
    pub localized: bool,
    pub header_image: Option<String>,
    pub metacritic: Option<u32>,
    pub pc_requirements: Option<PcRequirements>,
    pub store_url: String,
}

fn steam_language(locale: &str) -> Option<&'static str> {
    static LANGUAGES: OnceCell<HashMap<&'static str, &'static str>> = OnceCell::new();
    LANGUAGES
        .get_or_init(|| {
            HashMap::from([
                ("en", "english"),
                ("fr", "french"),
                ("de", "german"),
                ("es", "spanish"),
                ("it", "italian"),
                ("pt", "brazilian"),
                ("ru", "russian"),
                ("ja", "japanese"),
                ("ko", "koreana"),
                ("zh", "schinese"),
                ("pl", "polish"),
                ("nl", "dutch"),
                ("sv", "swedish"),
                ("tr", "turkish"),
            ])
        })
        .get(locale)
        .copied()
}

/// Pull the numeric appid out of a storefront deep link like
/// `https://store.steampowered.com/app/271590/Grand_Theft_Auto_V/`.
pub fn appid_from_url(url: &str) -> Option<u64> {
    static APP_ID: OnceCell<Regex> = OnceCell::new();
    let re = APP_ID.get_or_init(|| Regex::new(r"/app/(\d+)").unwrap());
    re.captures(url)?.get(1)?.as_str().parse().ok()
}

fn requirements_from_value(value: Option<Value>) -> Option<PcRequirements> {
    let obj = match value {
        Some(Value::Object(obj)) => obj,
        // Empty array means "no PC requirements listed".
        _ => return None,
    };
    let text = |key: &str| {
        obj.get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
    };
    let requirements = PcRequirements {
        minimum: text("minimum"),
        recommended: text("recommended"),
    };
    (!requirements.is_empty()).then_some(requirements)
}

pub struct SteamClient {
    client: Client,
}

impl SteamClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn get_storefront(&self, app_id: u64, locale: &str) -> Result<Option<SteamStorefront>> {
        let language = steam_language(locale);
        let response = self
            .client
            .get(APPDETAILS_URL)
            .query(&[
                ("appids", app_id.to_string().as_str()),
                ("l", language.unwrap_or("english")),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            info!("Steam storefront error for {app_id}: Status {}", response.status());
            return Ok(None);
        }

        let mut data: HashMap<String, SteamStoreData> = response.json().await?;
        let Some(details) = data
            .remove(&app_id.to_string())
            .filter(|d| d.success)
            .and_then(|d| d.data)
        else {
            info!("Steam storefront has no data for {app_id}");
            return Ok(None);
        };

        Ok(Some(SteamStorefront {
            description: details
                .short_description
                .filter(|d| !d.trim().is_empty()),
            localized: language.is_some() && locale != "en",
            header_image: details.header_image,
            metacritic: details.metacritic.map(|m| m.score),
            pc_requirements: requirements_from_value(details.pc_requirements),
            store_url: format!("https://store.steampowered.com/app/{app_id}"),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appid_extraction_from_deep_links() {
        assert_eq!(
            appid_from_url("https://store.steampowered.com/app/271590/Grand_Theft_Auto_V/"),
            Some(271590)
        );
        assert_eq!(
            appid_from_url("https://store.steampowered.com/app/620"),
            Some(620)
        );
        assert_eq!(appid_from_url("https://store.steampowered.com"), None);
    }

    #[test]
    fn requirements_tolerate_both_provider_shapes() {
        let object = serde_json::json!({
            "minimum": "<strong>Minimum:</strong><br>8 GB RAM",
            "recommended": ""
        });
        let requirements = requirements_from_value(Some(object)).unwrap();
        assert!(requirements.minimum.is_some());
        assert!(requirements.recommended.is_none());

        assert!(requirements_from_value(Some(serde_json::json!([]))).is_none());
        assert!(requirements_from_value(None).is_none());
    }

    #[test]
    fn locale_mapping_falls_back_to_english() {
        assert_eq!(steam_language("fr"), Some("french"));
        assert_eq!(steam_language("xx"), None);
    }
}
