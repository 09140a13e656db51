use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::error::AppError;
use crate::riot::Platform;
use crate::riot::types::{ARENA_QUEUE_IDS, ParticipantDto, SUMMONERS_RIFT_MAP_ID};

pub(crate) fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

pub(crate) fn from_millis(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or(DateTime::UNIX_EPOCH)
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Summoner {
    pub puuid: String,
    pub game_name: String,
    pub tag_line: String,
    pub region: String,
    pub profile_icon_id: i32,
    pub summoner_level: i64,
    pub revision_date: i64,
    pub updated_at: i64,
}

impl Summoner {
    pub fn riot_id(&self) -> String {
        format!("{}#{}", self.game_name, self.tag_line)
    }

    pub fn platform(&self) -> Result<Platform, AppError> {
        self.region.parse()
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        from_millis(self.updated_at)
    }

    /// Whether the cached row is older than `max_age` at `now`.
    pub fn is_stale(&self, now: DateTime<Utc>, max_age: chrono::Duration) -> bool {
        now - self.updated_at() > max_age
    }
}

/// Fields written by a summoner refresh.
#[derive(Debug, Clone)]
pub struct SummonerUpsert<'a> {
    pub puuid: &'a str,
    pub game_name: &'a str,
    pub tag_line: &'a str,
    pub platform: Platform,
    pub profile_icon_id: i32,
    pub summoner_level: i64,
    pub revision_date: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct MatchRow {
    pub match_id: String,
    pub game_id: i64,
    pub game_creation: i64,
    pub game_start_timestamp: i64,
    pub game_end_timestamp: Option<i64>,
    pub game_duration: i64,
    pub game_mode: String,
    pub game_version: String,
    pub map_id: i32,
    pub queue_id: i32,
    pub participants: String,
}

/// A match with its typed participant list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredMatch {
    pub match_id: String,
    pub game_id: i64,
    pub game_creation: i64,
    pub game_start_timestamp: i64,
    pub game_end_timestamp: Option<i64>,
    pub game_duration: i64,
    pub game_mode: String,
    pub game_version: String,
    pub map_id: i32,
    pub queue_id: i32,
    pub participants: Vec<ParticipantDto>,
}

impl StoredMatch {
    pub fn is_arena(&self) -> bool {
        ARENA_QUEUE_IDS.contains(&self.queue_id)
    }

    pub fn is_summoners_rift(&self) -> bool {
        self.map_id == SUMMONERS_RIFT_MAP_ID
    }
}

impl TryFrom<MatchRow> for StoredMatch {
    type Error = AppError;

    fn try_from(row: MatchRow) -> Result<Self, Self::Error> {
        Ok(Self {
            participants: serde_json::from_str(&row.participants)?,
            match_id: row.match_id,
            game_id: row.game_id,
            game_creation: row.game_creation,
            game_start_timestamp: row.game_start_timestamp,
            game_end_timestamp: row.game_end_timestamp,
            game_duration: row.game_duration,
            game_mode: row.game_mode,
            game_version: row.game_version,
            map_id: row.map_id,
            queue_id: row.queue_id,
        })
    }
}

/// Which stored matches a query should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSubset {
    All,
    SummonersRift,
    Arena,
    /// Matches whose `gameStartTimestamp` is at or after the given instant.
    StartedSince(DateTime<Utc>),
}

impl MatchSubset {
    pub fn contains(&self, m: &StoredMatch) -> bool {
        match self {
            Self::All => true,
            Self::SummonersRift => m.is_summoners_rift(),
            Self::Arena => m.is_arena(),
            Self::StartedSince(at) => m.game_start_timestamp >= to_millis(*at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct ChampionMastery {
    pub champion_id: i64,
    pub puuid: String,
    pub champion_level: i32,
    pub champion_points: i64,
    pub last_play_time: i64,
    pub tokens_earned: i32,
    pub points_since_last_level: i64,
    pub points_until_next_level: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct ChampionDetails {
    pub id: i64,
    pub key: String,
    pub name: String,
    pub title: String,
    pub tags: String,
    pub image: String,
    pub version: String,
}

/// Challenge definition joined with one localization.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct ChallengeConfigEntry {
    pub id: i64,
    pub state: String,
    pub leaderboard: bool,
    pub thresholds: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,
}

/// Riot-scored progress on one challenge.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct ChallengeProgress {
    pub challenge_id: i64,
    pub percentile: f64,
    pub level: String,
    pub value: f64,
    pub achieved_time: Option<i64>,
}
