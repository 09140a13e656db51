use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

// ============================================================================
// Account-v1
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDto {
    pub puuid: String,
    pub game_name: Option<String>,
    pub tag_line: Option<String>,
}

// ============================================================================
// Summoner-v4
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummonerDto {
    pub puuid: String,
    pub profile_icon_id: i32,
    pub summoner_level: i64,
    /// Epoch milliseconds of the last profile change.
    pub revision_date: i64,
}

// ============================================================================
// Champion-Mastery-v4
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChampionMasteryDto {
    pub champion_id: i64,
    pub champion_level: i32,
    pub champion_points: i64,
    #[serde(default)]
    pub last_play_time: i64,
    #[serde(default)]
    pub tokens_earned: i32,
    #[serde(default)]
    pub champion_points_since_last_level: i64,
    #[serde(default)]
    pub champion_points_until_next_level: i64,
}

// ============================================================================
// Match-v5
// ============================================================================

pub const SUMMONERS_RIFT_MAP_ID: i32 = 11;
pub const ARENA_QUEUE_IDS: [i32; 2] = [1700, 1710];

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDto {
    pub metadata: MetadataDto,
    pub info: InfoDto,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataDto {
    pub match_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoDto {
    pub game_id: i64,
    pub game_creation: i64,
    pub game_start_timestamp: i64,
    #[serde(default)]
    pub game_end_timestamp: Option<i64>,
    pub game_duration: i64,
    pub game_mode: String,
    pub game_version: String,
    pub map_id: i32,
    pub queue_id: i32,
    /// Kept raw so a single malformed participant does not reject the match.
    pub participants: Vec<serde_json::Value>,
}

impl InfoDto {
    /// Validate every raw participant. Malformed entries are dropped and logged.
    pub fn validated_participants(&self, match_id: &str) -> Vec<ParticipantDto> {
        self.participants
            .iter()
            .enumerate()
            .filter_map(|(index, raw)| {
                match serde_json::from_value::<ParticipantDto>(raw.clone()) {
                    Ok(p) => Some(p),
                    Err(e) => {
                        warn!(match_id, index, error = %e, "🛰️ ⚠️ Quarantined malformed participant");
                        None
                    }
                }
            })
            .collect()
    }
}

/// One player's statistics in a match, as stored alongside the match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDto {
    pub puuid: String,
    pub champion_id: i64,
    #[serde(default)]
    pub champion_name: String,
    pub team_id: i32,
    pub win: bool,
    pub kills: i32,
    pub deaths: i32,
    pub assists: i32,
    /// Arena final standing; 0 outside Arena.
    #[serde(default)]
    pub placement: i32,
}

// ============================================================================
// Challenges-v1
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeConfigDto {
    pub id: i64,
    #[serde(default)]
    pub localized_names: HashMap<String, LocalizedNamesDto>,
    pub state: String,
    #[serde(default)]
    pub leaderboard: bool,
    #[serde(default)]
    pub thresholds: HashMap<String, f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalizedNamesDto {
    #[serde(default)]
    pub description: String,
    pub name: String,
    #[serde(default)]
    pub short_description: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerChallengesDto {
    #[serde(default)]
    pub challenges: Vec<ChallengeInfoDto>,
    #[serde(default)]
    pub preferences: PreferencesDto,
    pub total_points: ChallengePointsDto,
    #[serde(default)]
    pub category_points: HashMap<String, ChallengePointsDto>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeInfoDto {
    pub challenge_id: i64,
    #[serde(default)]
    pub percentile: f64,
    pub level: String,
    #[serde(default)]
    pub value: f64,
    #[serde(default)]
    pub achieved_time: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesDto {
    #[serde(default)]
    pub banner_accent: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub challenge_ids: Vec<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengePointsDto {
    pub level: String,
    pub current: i64,
    pub max: i64,
    #[serde(default)]
    pub percentile: Option<f64>,
}

// ============================================================================
// Data Dragon
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ChampionListDto {
    pub version: String,
    pub data: HashMap<String, ChampionDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChampionDto {
    /// Data Dragon string id ("MonkeyKing").
    pub id: String,
    /// Numeric champion id as a string ("62").
    pub key: String,
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub image: ImageDto,
    #[serde(default)]
    pub stats: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageDto {
    pub full: String,
}
