mod game;
mod identifier;
pub(crate) mod source;
pub(crate) mod storage;

pub use game::{
    ClipCandidate, GameRecord, GameVideo, NamedSlug, PcRequirements, StorefrontLink, VideoSource,
    CANONICAL_TTL_DAYS, ENRICHED_TTL_HOURS, GAMEPLAY_CAP, SCREENSHOT_CAP, TRAILER_CAP,
};
pub use identifier::{clean_identifier, GameIdentifier, IdSource, ResolvedId};
pub use storage::{CacheEntry, CacheKey};
