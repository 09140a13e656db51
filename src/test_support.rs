//! Fixtures shared by the unit tests: an in-memory store, match builders
//! and a scriptable stand-in for the Riot API.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;

use crate::db::{self, Repository, StoredMatch, Summoner, SummonerUpsert};
use crate::riot::types::{
    AccountDto, ChallengeConfigDto, ChampionListDto, ChampionMasteryDto, InfoDto, MatchDto,
    MetadataDto, ParticipantDto, PlayerChallengesDto, SummonerDto,
};
use crate::riot::{ApiError, Platform, Region, RiotApi, RiotApiResponse};

pub async fn memory_repository() -> Repository {
    let pool = db::connect("sqlite::memory:").await.unwrap();
    db::run_migrations(&pool).await.unwrap();
    Repository::new(pool)
}

pub async fn seed_summoner(
    db: &Repository,
    puuid: &str,
    game_name: &str,
    tag_line: &str,
    updated_at: DateTime<Utc>,
) -> Summoner {
    db.upsert_summoner(&SummonerUpsert {
        puuid,
        game_name,
        tag_line,
        platform: Platform::EUW1,
        profile_icon_id: 1,
        summoner_level: 30,
        revision_date: 0,
        updated_at,
    })
    .await
    .unwrap()
}

pub fn participant(puuid: &str, champion_id: i64, win: bool) -> ParticipantDto {
    ParticipantDto {
        puuid: puuid.to_string(),
        champion_id,
        champion_name: String::new(),
        team_id: 100,
        win,
        kills: 5,
        deaths: 2,
        assists: 7,
        placement: 0,
    }
}

fn build_match(
    match_id: &str,
    start_ms: i64,
    map_id: i32,
    queue_id: i32,
    participants: Vec<ParticipantDto>,
) -> MatchDto {
    MatchDto {
        metadata: MetadataDto {
            match_id: match_id.to_string(),
        },
        info: InfoDto {
            game_id: start_ms,
            game_creation: start_ms,
            game_start_timestamp: start_ms,
            game_end_timestamp: Some(start_ms + 1_800_000),
            game_duration: 1800,
            game_mode: if queue_id == 1700 { "CHERRY" } else { "CLASSIC" }.to_string(),
            game_version: "14.19.1".to_string(),
            map_id,
            queue_id,
            participants: participants
                .iter()
                .map(|p| serde_json::to_value(p).unwrap())
                .collect(),
        },
    }
}

/// Ranked solo game on Summoner's Rift.
pub fn rift_match(match_id: &str, start_ms: i64, participants: Vec<ParticipantDto>) -> MatchDto {
    build_match(match_id, start_ms, 11, 420, participants)
}

pub fn arena_match(match_id: &str, start_ms: i64, participants: Vec<ParticipantDto>) -> MatchDto {
    build_match(match_id, start_ms, 30, 1700, participants)
}

pub async fn store_match(db: &Repository, m: &MatchDto) {
    let participants = m.info.validated_participants(&m.metadata.match_id);
    db.insert_match(&m.metadata.match_id, &m.info, &participants, Utc::now())
        .await
        .unwrap();
}

/// The stored form of `m`, without going through the database.
pub fn stored(m: &MatchDto) -> StoredMatch {
    let info = &m.info;
    StoredMatch {
        match_id: m.metadata.match_id.clone(),
        game_id: info.game_id,
        game_creation: info.game_creation,
        game_start_timestamp: info.game_start_timestamp,
        game_end_timestamp: info.game_end_timestamp,
        game_duration: info.game_duration,
        game_mode: info.game_mode.clone(),
        game_version: info.game_version.clone(),
        map_id: info.map_id,
        queue_id: info.queue_id,
        participants: info.validated_participants(&m.metadata.match_id),
    }
}

pub fn mastery(champion_id: i64, points: i64) -> ChampionMasteryDto {
    ChampionMasteryDto {
        champion_id,
        champion_level: 5,
        champion_points: points,
        last_play_time: 0,
        tokens_earned: 0,
        champion_points_since_last_level: 0,
        champion_points_until_next_level: 0,
    }
}

#[derive(Debug, Clone)]
struct FakeAccount {
    puuid: String,
    game_name: String,
    tag_line: String,
}

#[derive(Debug, Default)]
struct FakeState {
    accounts: Vec<FakeAccount>,
    match_ids: HashMap<String, Vec<String>>,
    matches: HashMap<String, MatchDto>,
    masteries: HashMap<String, Vec<ChampionMasteryDto>>,
    failures: HashMap<&'static str, fn() -> ApiError>,
    calls: HashMap<&'static str, u32>,
}

/// In-memory [`RiotApi`] with call counters and scripted failures.
#[derive(Debug, Default)]
pub struct FakeRiot {
    state: Mutex<FakeState>,
    rate_limited: AtomicU32,
}

impl FakeRiot {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_account(&self, puuid: &str, game_name: &str, tag_line: &str) {
        let mut state = self.state.lock().unwrap();
        state.accounts.retain(|a| a.puuid != puuid);
        state.accounts.push(FakeAccount {
            puuid: puuid.to_string(),
            game_name: game_name.to_string(),
            tag_line: tag_line.to_string(),
        });
    }

    pub fn add_match(&self, puuid: &str, m: MatchDto) {
        let mut state = self.state.lock().unwrap();
        let id = m.metadata.match_id.clone();
        state
            .match_ids
            .entry(puuid.to_string())
            .or_default()
            .insert(0, id.clone());
        state.matches.insert(id, m);
    }

    pub fn set_masteries(&self, puuid: &str, masteries: Vec<ChampionMasteryDto>) {
        self.state
            .lock()
            .unwrap()
            .masteries
            .insert(puuid.to_string(), masteries);
    }

    /// The next `n` calls, whatever the endpoint, answer 429.
    pub fn rate_limit_next(&self, n: u32) {
        self.rate_limited.store(n, Ordering::SeqCst);
    }

    /// Every call to `method` fails with the error built by `error`.
    pub fn fail_on(&self, method: &'static str, error: fn() -> ApiError) {
        self.state.lock().unwrap().failures.insert(method, error);
    }

    pub fn calls(&self) -> u32 {
        self.state.lock().unwrap().calls.values().sum()
    }

    pub fn calls_to(&self, method: &str) -> u32 {
        self.state
            .lock()
            .unwrap()
            .calls
            .get(method)
            .copied()
            .unwrap_or(0)
    }

    async fn record(&self, method: &'static str) -> Result<(), ApiError> {
        let failure = {
            let mut state = self.state.lock().unwrap();
            *state.calls.entry(method).or_default() += 1;
            state.failures.get(method).copied()
        };

        let limited = self
            .rate_limited
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if limited {
            return Err(ApiError::RateLimited {
                retry_after: Some(Duration::from_millis(10)),
            });
        }

        match failure {
            Some(make) => Err(make()),
            None => Ok(()),
        }
    }

    fn account_where(&self, pred: impl Fn(&FakeAccount) -> bool) -> RiotApiResponse<AccountDto> {
        let state = self.state.lock().unwrap();
        state
            .accounts
            .iter()
            .find(|a| pred(a))
            .map(|a| AccountDto {
                puuid: a.puuid.clone(),
                game_name: Some(a.game_name.clone()),
                tag_line: Some(a.tag_line.clone()),
            })
            .ok_or(ApiError::NotFound)
    }
}

#[async_trait]
impl RiotApi for FakeRiot {
    async fn get_account_by_riot_id(
        &self,
        game_name: &str,
        tag_line: &str,
        _region: Region,
    ) -> RiotApiResponse<AccountDto> {
        self.record("get_account_by_riot_id").await?;
        self.account_where(|a| {
            a.game_name.eq_ignore_ascii_case(game_name) && a.tag_line.eq_ignore_ascii_case(tag_line)
        })
    }

    async fn get_account_by_puuid(
        &self,
        puuid: &str,
        _region: Region,
    ) -> RiotApiResponse<AccountDto> {
        self.record("get_account_by_puuid").await?;
        self.account_where(|a| a.puuid == puuid)
    }

    async fn get_summoner_by_puuid(
        &self,
        puuid: &str,
        _platform: Platform,
    ) -> RiotApiResponse<SummonerDto> {
        self.record("get_summoner_by_puuid").await?;
        self.account_where(|a| a.puuid == puuid)?;
        Ok(SummonerDto {
            puuid: puuid.to_string(),
            profile_icon_id: 4568,
            summoner_level: 412,
            revision_date: 1_700_000_000_000,
        })
    }

    async fn get_match_ids(
        &self,
        puuid: &str,
        _region: Region,
        start: u32,
        count: u32,
    ) -> RiotApiResponse<Vec<String>> {
        self.record("get_match_ids").await?;
        let state = self.state.lock().unwrap();
        Ok(state
            .match_ids
            .get(puuid)
            .map(|ids| {
                ids.iter()
                    .skip(start as usize)
                    .take(count as usize)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_match(&self, match_id: &str, _region: Region) -> RiotApiResponse<MatchDto> {
        self.record("get_match").await?;
        let state = self.state.lock().unwrap();
        state.matches.get(match_id).cloned().ok_or(ApiError::NotFound)
    }

    async fn get_champion_masteries(
        &self,
        puuid: &str,
        _platform: Platform,
    ) -> RiotApiResponse<Vec<ChampionMasteryDto>> {
        self.record("get_champion_masteries").await?;
        let state = self.state.lock().unwrap();
        Ok(state.masteries.get(puuid).cloned().unwrap_or_default())
    }

    async fn get_challenges_config(
        &self,
        _platform: Platform,
    ) -> RiotApiResponse<Vec<ChallengeConfigDto>> {
        self.record("get_challenges_config").await?;
        Ok(serde_json::from_value(json!([{
            "id": 401106,
            "state": "ENABLED",
            "leaderboard": true,
            "thresholds": { "IRON": 1.0, "GOLD": 10.0, "MASTER": 150.0 },
            "localizedNames": {
                "en_US": {
                    "name": "Invincible",
                    "description": "Win games without dying",
                    "shortDescription": "Win flawlessly"
                }
            }
        }]))
        .unwrap())
    }

    async fn get_player_challenges(
        &self,
        _puuid: &str,
        _platform: Platform,
    ) -> RiotApiResponse<PlayerChallengesDto> {
        self.record("get_player_challenges").await?;
        Ok(serde_json::from_value(json!({
            "challenges": [
                { "challengeId": 401106, "percentile": 0.12, "level": "GOLD", "value": 14.0 }
            ],
            "preferences": { "challengeIds": [401106] },
            "totalPoints": { "level": "GOLD", "current": 4200, "max": 9000, "percentile": 0.3 },
            "categoryPoints": {}
        }))
        .unwrap())
    }

    async fn get_latest_version(&self) -> RiotApiResponse<String> {
        self.record("get_latest_version").await?;
        Ok("14.19.1".to_string())
    }

    async fn get_champion_details(&self, version: &str) -> RiotApiResponse<ChampionListDto> {
        self.record("get_champion_details").await?;
        Ok(serde_json::from_value(json!({
            "version": version,
            "data": {
                "Ahri": { "id": "Ahri", "key": "103", "name": "Ahri",
                          "title": "the Nine-Tailed Fox", "tags": ["Mage", "Assassin"],
                          "image": { "full": "Ahri.png" } },
                "Twitch": { "id": "Twitch", "key": "29", "name": "Twitch",
                            "title": "the Plague Rat", "tags": ["Marksman"],
                            "image": { "full": "Twitch.png" } }
            }
        }))
        .unwrap())
    }
}
