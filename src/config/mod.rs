use crate::config::cli::Args;
use crate::error::Result;
use clap::Parser;
use reqwest::Client;
use std::time::Duration;
use tracing::info;

pub(crate) mod cli;

// Provider calls are bounded by this timeout; a timed-out provider is
// treated like any other unavailable provider.
const HTTP_TIMEOUT_SECS: u64 = 10;

pub struct Config {
    pub args: Args,
    pub http_client: Client,
}

impl Config {
    pub fn new() -> Result<Self> {
        let args = Args::parse();

        let http_client = Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .user_agent("factiony-gamedata/0.1")
            .build()?;

        Ok(Self { args, http_client })
    }

    pub fn ensure_directories(&self) -> Result<()> {
        if !self.args.data_dir.exists() {
            std::fs::create_dir_all(&self.args.data_dir)?;
        }
        if !self.args.cache_dir.exists() {
            std::fs::create_dir_all(&self.args.cache_dir)?;
        }

        info!("Data and cache dirs exist");
        Ok(())
    }
}
