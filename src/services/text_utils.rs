use crate::domain::PcRequirements;
use once_cell::sync::OnceCell;
use regex::Regex;
use scraper::Html;

static BR_TAG: OnceCell<Regex> = OnceCell::new();
static LI_OPEN: OnceCell<Regex> = OnceCell::new();
static BLOCK_CLOSE: OnceCell<Regex> = OnceCell::new();

/// Reduce a provider HTML fragment to plain text, preserving line breaks and
/// turning list items into `- ` markers.
pub fn sanitize_fragment(fragment: &str) -> String {
    let br = BR_TAG.get_or_init(|| Regex::new(r"(?i)<br\s*/?>").unwrap());
    let li = LI_OPEN.get_or_init(|| Regex::new(r"(?i)<li[^>]*>").unwrap());
    let block = BLOCK_CLOSE.get_or_init(|| Regex::new(r"(?i)</(p|div|ul|ol|li|h[1-6])>").unwrap());

    let text = br.replace_all(fragment, "\n");
    let text = li.replace_all(&text, "\n- ");
    let text = block.replace_all(&text, "\n");

    let document = Html::parse_fragment(&text);
    let raw: String = document.root_element().text().collect();

    let mut lines: Vec<&str> = Vec::new();
    for line in raw.lines() {
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            lines.push(trimmed);
        }
    }
    lines.join("\n")
}

pub fn sanitize_requirements(requirements: &PcRequirements) -> PcRequirements {
    let clean = |field: &Option<String>| {
        field
            .as_deref()
            .map(sanitize_fragment)
            .filter(|s| !s.is_empty())
    };
    PcRequirements {
        minimum: clean(&requirements.minimum),
        recommended: clean(&requirements.recommended),
    }
}
