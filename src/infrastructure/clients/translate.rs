use crate::error::Result;
use reqwest::Client;
use serde_json::Value;
use tracing::info;

const TRANSLATE_URL: &str = "https://translate.googleapis.com/translate_a/single";

// Keep request URLs inside sane limits; long descriptions are truncated
// rather than chunked.
const MAX_INPUT_CHARS: usize = 4000;

/// Best-effort, keyless machine translation. Every failure mode comes back
/// as `None` so callers can fall back to the original-locale text silently.
pub struct Translator {
    client: Client,
}

impl Translator {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn translate(&self, text: &str, target_locale: &str) -> Result<Option<String>> {
        let input: String = text.chars().take(MAX_INPUT_CHARS).collect();
        let response = self
            .client
            .get(TRANSLATE_URL)
            .query(&[
                ("client", "gtx"),
                ("sl", "auto"),
                ("tl", target_locale),
                ("dt", "t"),
                ("q", input.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            info!("Translation unavailable: Status {}", response.status());
            return Ok(None);
        }

        let payload: Value = response.json().await?;
        let segments = match payload.get(0).and_then(Value::as_array) {
            Some(segments) => segments,
            None => return Ok(None),
        };

        let translated: String = segments
            .iter()
            .filter_map(|segment| segment.get(0).and_then(Value::as_str))
            .collect();

        Ok((!translated.trim().is_empty()).then_some(translated))
    }
}
