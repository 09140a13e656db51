//! SQLite storage for summoners, matches, masteries, reference data and
//! challenge results.

use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::info;

use crate::error::AppError;

mod achievements;
mod challenges;
mod mastery;
mod matches;
mod migrations;
mod models;
mod reference;
mod repository;

pub use migrations::run_migrations;
pub use models::{
    ChallengeConfigEntry, ChallengeProgress, ChampionDetails, ChampionMastery, MatchSubset,
    StoredMatch, Summoner, SummonerUpsert,
};
pub(crate) use models::{from_millis, to_millis};
pub use repository::Repository;

/// Open a pool on `url` with foreign keys enforced.
pub async fn connect(url: &str) -> Result<SqlitePool, AppError> {
    let options = SqliteConnectOptions::from_str(url)?
        .foreign_keys(true)
        .create_if_missing(true);

    // Every connection to `:memory:` is a distinct database.
    let in_memory = url.contains(":memory:");
    let pool_options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(8)
    };

    let pool = pool_options.connect_with(options).await?;
    info!(in_memory, "🗄️ Database pool opened");
    Ok(pool)
}
