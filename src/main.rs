use crate::config::cli::Command;
use crate::config::Config;
use crate::domain::source::GameSource;
use crate::domain::storage::Store;
use crate::error::Result;
use crate::infrastructure::{
    FileSystemStore, RawgClient, SteamClient, Translator, YoutubeClient,
};
use crate::services::{
    BatchResolver, CacheSweeper, DiscoveryService, Enrichment, GameDataCache, GameDataService,
    GameResolver,
};
use indicatif::ProgressBar;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

mod config;
mod domain;
mod error;
mod infrastructure;
mod services;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::new()?;
    config.ensure_directories()?;

    let store: Arc<dyn Store> = Arc::new(FileSystemStore::new(
        &config.args.data_dir,
        &config.args.cache_dir,
    ));
    let rawg = Arc::new(RawgClient::new(
        config.http_client.clone(),
        config.args.rawg_api_key.clone(),
    ));
    let steam = Arc::new(SteamClient::new(config.http_client.clone()));
    let youtube = Arc::new(YoutubeClient::new(
        config.http_client.clone(),
        config.args.youtube_api_key.clone(),
    ));
    let translator = Translator::new(config.http_client.clone());

    let enrichment = Enrichment::new(
        Arc::clone(&rawg),
        steam,
        youtube,
        translator,
        Arc::clone(&store),
    );
    let resolver = Arc::new(GameResolver::new(
        Arc::clone(&rawg),
        enrichment,
        Arc::clone(&store),
    ));
    let source: Arc<dyn GameSource> = Arc::new(BatchResolver::new(resolver));
    let cache = GameDataCache::new(source, Arc::clone(&store));
    let discovery = DiscoveryService::new(Arc::clone(&store), rawg);
    let service = GameDataService::new(cache, discovery);

    match &config.args.command {
        Command::Game { identifier } => {
            let response = service.fetch_game(identifier, &config.args.locale).await;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::Games { identifiers } => {
            let ids: Vec<String> = identifiers
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();

            let spinner = ProgressBar::new_spinner();
            spinner.set_message(format!("Resolving {} games", ids.len()));
            spinner.enable_steady_tick(Duration::from_millis(120));
            let response = service.fetch_games(&ids, &config.args.locale).await;
            spinner.finish_and_clear();

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::Discover { limit } => {
            let response = service.discovery_catalog(*limit).await;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::Sweep { watch } => {
            let sweeper = CacheSweeper::new(store);
            match watch {
                Some(secs) => sweeper.run(Duration::from_secs(*secs)).await,
                None => sweeper.run_once(),
            }
        }
    }

    info!("Done");
    Ok(())
}
