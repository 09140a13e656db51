use thiserror::Error;

use crate::jobs::QueueError;
use crate::riot::ApiError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Riot API error: {0}")]
    Riot(#[from] ApiError),

    #[error("Summoner not found: {game_name}#{tag_line}")]
    SummonerNotFound { game_name: String, tag_line: String },

    /// The cached name no longer resolves upstream but its puuid is known.
    #[error("Riot ID {game_name}#{tag_line} no longer resolves (puuid {puuid})")]
    StaleIdentity {
        game_name: String,
        tag_line: String,
        puuid: String,
    },

    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Job queue error: {0}")]
    Queue(#[from] QueueError),
}

impl AppError {
    /// Whether retrying the same operation later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::Riot(e) => e.is_transient(),
            AppError::Database(sqlx::Error::PoolTimedOut) => true,
            _ => false,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, AppError::Riot(ApiError::RateLimited { .. }))
    }
}
