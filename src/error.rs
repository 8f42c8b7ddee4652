use thiserror::Error;

#[derive(Error, Debug)]
pub enum GameDataError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Store error: {0}")]
    Store(String),
    #[error("Game not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, GameDataError>;
