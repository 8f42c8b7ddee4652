pub(crate) mod batch;
pub(crate) mod discovery;
pub(crate) mod enrichment;
pub(crate) mod game_cache;
pub(crate) mod game_service;
pub(crate) mod resolver;
pub(crate) mod scoring;
pub(crate) mod sweeper;
pub(crate) mod text_utils;

pub use batch::BatchResolver;
pub use discovery::DiscoveryService;
pub use enrichment::Enrichment;
pub use game_cache::GameDataCache;
pub use game_service::GameDataService;
pub use resolver::GameResolver;
pub use sweeper::CacheSweeper;
