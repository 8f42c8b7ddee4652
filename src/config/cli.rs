use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Args {
    /// Directory holding the canonical games table
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Directory holding the TTL-bound API cache
    #[arg(long, default_value = "cache")]
    pub cache_dir: PathBuf,

    /// RAWG API key for catalog and media lookups
    #[clap(long, env = "RAWG_API_KEY")]
    pub rawg_api_key: Option<String>,

    /// YouTube Data API key for the video-search fallback
    #[clap(long, env = "YOUTUBE_API_KEY")]
    pub youtube_api_key: Option<String>,

    /// Locale for description and requirement text
    #[arg(long, default_value = "en")]
    pub locale: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve a single game by numeric id or slug
    Game { identifier: String },

    /// Resolve a comma-separated list of games in one batch
    Games { identifiers: String },

    /// Top-rated discovery catalog
    Discover {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Purge expired cache entries
    Sweep {
        /// Keep sweeping every N seconds instead of exiting
        #[arg(long)]
        watch: Option<u64>,
    },
}
