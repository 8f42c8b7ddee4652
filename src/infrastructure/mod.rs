mod clients;
mod storage;

pub use clients::rawg::RawgClient;
pub use clients::steam::{appid_from_url, SteamClient, SteamStorefront};
pub use clients::translate::Translator;
pub use clients::youtube::YoutubeClient;
pub use storage::fs_store::FileSystemStore;
