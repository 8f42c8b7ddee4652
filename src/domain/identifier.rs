use once_cell::sync::OnceCell;
use regex::Regex;
use serde::Serialize;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// An identifier as handed in by a caller: either a provider-native numeric
/// id or a human-readable slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameIdentifier {
    Id(u64),
    Slug(String),
}

impl GameIdentifier {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<u64>() {
            Ok(id) => GameIdentifier::Id(id),
            Err(_) => GameIdentifier::Slug(trimmed.to_string()),
        }
    }
}

/// How the provider-native id was obtained. `Fallback` means the cleaned
/// string is being used as-is and downstream callers must tolerate
/// "not found".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdSource {
    Canonical,
    Numeric,
    SlugLookup,
    Fuzzy,
    Fallback,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolvedId {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub slug: String,
    pub source: IdSource,
}

static PARENTHETICAL: OnceCell<Regex> = OnceCell::new();
static LOCALE_SUFFIX: OnceCell<Regex> = OnceCell::new();
static NON_ALNUM: OnceCell<Regex> = OnceCell::new();

/// Strip known locale/parenthetical suffixes and slugify what remains, so a
/// display title like "The Witcher 3: Wild Hunt (RU)" can be tried as a
/// provider slug.
pub fn clean_identifier(raw: &str) -> String {
    let parenthetical =
        PARENTHETICAL.get_or_init(|| Regex::new(r"\s*\([^)]*\)\s*$").unwrap());
    let locale_suffix = LOCALE_SUFFIX
        .get_or_init(|| Regex::new(r"[-_](en|fr|de|es|it|pt|ru|ja|ko|zh|pl|tr|nl|sv)$").unwrap());
    let non_alnum = NON_ALNUM.get_or_init(|| Regex::new(r"[^a-z0-9]+").unwrap());

    let stripped = parenthetical.replace(raw.trim(), "");
    let stripped = locale_suffix.replace(&stripped, "");

    let ascii: String = stripped
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();

    non_alnum
        .replace_all(&ascii, "-")
        .trim_matches('-')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_identifiers_parse_to_ids() {
        assert_eq!(GameIdentifier::parse("12345"), GameIdentifier::Id(12345));
        assert_eq!(GameIdentifier::parse(" 42 "), GameIdentifier::Id(42));
        assert_eq!(
            GameIdentifier::parse("portal-2"),
            GameIdentifier::Slug("portal-2".into())
        );
    }

    #[test]
    fn clean_identifier_strips_suffixes_and_slugifies() {
        assert_eq!(
            clean_identifier("The Witcher 3: Wild Hunt (RU)"),
            "the-witcher-3-wild-hunt"
        );
        assert_eq!(clean_identifier("cyberpunk-2077_fr"), "cyberpunk-2077");
        assert_eq!(clean_identifier("Pokémon Légendes"), "pokemon-legendes");
        assert_eq!(clean_identifier("  Hades II  "), "hades-ii");
    }

    #[test]
    fn clean_identifier_keeps_plain_slugs_untouched() {
        assert_eq!(clean_identifier("elden-ring"), "elden-ring");
    }
}
