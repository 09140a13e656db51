use sqlx::SqlitePool;
use tracing::info;

use crate::error::AppError;

// Timestamps are epoch milliseconds (UTC).
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS summoners (
    puuid TEXT PRIMARY KEY,
    game_name TEXT NOT NULL,
    tag_line TEXT NOT NULL,
    region TEXT NOT NULL,
    profile_icon_id INTEGER NOT NULL DEFAULT 0,
    summoner_level INTEGER NOT NULL DEFAULT 0,
    revision_date INTEGER NOT NULL DEFAULT 0,
    updated_at INTEGER NOT NULL,
    -- Last time the sweeper queued a refresh, successful or not.
    swept_at INTEGER
);

CREATE INDEX IF NOT EXISTS idx_summoners_riot_id
    ON summoners(game_name COLLATE NOCASE, tag_line COLLATE NOCASE, region);
CREATE INDEX IF NOT EXISTS idx_summoners_updated_at ON summoners(updated_at);

CREATE TABLE IF NOT EXISTS matches (
    match_id TEXT PRIMARY KEY,
    fetched_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS match_info (
    match_id TEXT PRIMARY KEY,
    game_id INTEGER NOT NULL,
    game_creation INTEGER NOT NULL,
    game_start_timestamp INTEGER NOT NULL,
    game_end_timestamp INTEGER,
    game_duration INTEGER NOT NULL,
    game_mode TEXT NOT NULL,
    game_version TEXT NOT NULL,
    map_id INTEGER NOT NULL,
    queue_id INTEGER NOT NULL,
    participants TEXT NOT NULL,
    FOREIGN KEY (match_id) REFERENCES matches(match_id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_match_info_start ON match_info(game_start_timestamp);

CREATE TABLE IF NOT EXISTS match_summoners (
    match_id TEXT NOT NULL,
    puuid TEXT NOT NULL,
    PRIMARY KEY (match_id, puuid),
    FOREIGN KEY (match_id) REFERENCES matches(match_id) ON DELETE CASCADE,
    FOREIGN KEY (puuid) REFERENCES summoners(puuid) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_match_summoners_puuid ON match_summoners(puuid);

CREATE TABLE IF NOT EXISTS champion_mastery (
    champion_id INTEGER NOT NULL,
    puuid TEXT NOT NULL,
    champion_level INTEGER NOT NULL,
    champion_points INTEGER NOT NULL,
    last_play_time INTEGER NOT NULL,
    tokens_earned INTEGER NOT NULL,
    points_since_last_level INTEGER NOT NULL,
    points_until_next_level INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    PRIMARY KEY (champion_id, puuid),
    FOREIGN KEY (puuid) REFERENCES summoners(puuid) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS champion_details (
    id INTEGER PRIMARY KEY,
    key TEXT NOT NULL,
    name TEXT NOT NULL,
    title TEXT NOT NULL,
    tags TEXT NOT NULL,
    image TEXT NOT NULL,
    stats TEXT NOT NULL,
    version TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS static_versions (
    name TEXT PRIMARY KEY,
    version TEXT NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS challenges_config (
    id INTEGER PRIMARY KEY,
    state TEXT NOT NULL,
    leaderboard INTEGER NOT NULL,
    thresholds TEXT NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS challenge_localization (
    challenge_id INTEGER NOT NULL,
    locale TEXT NOT NULL,
    name TEXT NOT NULL,
    description TEXT NOT NULL,
    short_description TEXT NOT NULL,
    PRIMARY KEY (challenge_id, locale),
    FOREIGN KEY (challenge_id) REFERENCES challenges_config(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS challenges (
    puuid TEXT PRIMARY KEY,
    FOREIGN KEY (puuid) REFERENCES summoners(puuid) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS challenges_details (
    puuid TEXT PRIMARY KEY,
    updated_at INTEGER NOT NULL,
    FOREIGN KEY (puuid) REFERENCES challenges(puuid) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS total_points (
    puuid TEXT PRIMARY KEY,
    level TEXT NOT NULL,
    current INTEGER NOT NULL,
    max INTEGER NOT NULL,
    percentile REAL,
    FOREIGN KEY (puuid) REFERENCES challenges_details(puuid) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS category_points (
    puuid TEXT NOT NULL,
    category TEXT NOT NULL,
    level TEXT NOT NULL,
    current INTEGER NOT NULL,
    max INTEGER NOT NULL,
    percentile REAL,
    PRIMARY KEY (puuid, category),
    FOREIGN KEY (puuid) REFERENCES challenges_details(puuid) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS challenge (
    puuid TEXT NOT NULL,
    challenge_id INTEGER NOT NULL,
    percentile REAL NOT NULL,
    level TEXT NOT NULL,
    value REAL NOT NULL,
    achieved_time INTEGER,
    PRIMARY KEY (puuid, challenge_id),
    FOREIGN KEY (puuid) REFERENCES challenges_details(puuid) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS preferences (
    puuid TEXT PRIMARY KEY,
    banner_accent TEXT,
    title TEXT,
    challenge_ids TEXT NOT NULL,
    FOREIGN KEY (puuid) REFERENCES challenges_details(puuid) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS challenge_heroes (
    puuid TEXT NOT NULL,
    champion_id INTEGER NOT NULL,
    PRIMARY KEY (puuid, champion_id),
    FOREIGN KEY (puuid) REFERENCES challenges(puuid) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS challenges_champion_ocean (
    puuid TEXT NOT NULL,
    champion_id INTEGER NOT NULL,
    PRIMARY KEY (puuid, champion_id),
    FOREIGN KEY (puuid) REFERENCES challenges(puuid) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS challenges_champion_ocean_2024_split3 (
    puuid TEXT NOT NULL,
    champion_id INTEGER NOT NULL,
    PRIMARY KEY (puuid, champion_id),
    FOREIGN KEY (puuid) REFERENCES challenges(puuid) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS challenges_adapt_to_all_situations (
    puuid TEXT NOT NULL,
    champion_id INTEGER NOT NULL,
    PRIMARY KEY (puuid, champion_id),
    FOREIGN KEY (puuid) REFERENCES challenges(puuid) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS challenges_invincible (
    puuid TEXT NOT NULL,
    champion_id INTEGER NOT NULL,
    PRIMARY KEY (puuid, champion_id),
    FOREIGN KEY (puuid) REFERENCES challenges(puuid) ON DELETE CASCADE
);
"#;

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), AppError> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    info!("🗄️ Database migrations completed");
    Ok(())
}
