pub mod client;
mod endpoints;
pub mod error;
pub mod metrics;
pub mod region;
pub mod types;

use std::fmt::Debug;

use async_trait::async_trait;

pub use client::RiotClient;
pub use error::{ApiError, RiotApiResponse};
pub use region::{Platform, Region};
use types::{
    AccountDto, ChallengeConfigDto, ChampionListDto, ChampionMasteryDto, MatchDto,
    PlayerChallengesDto, SummonerDto,
};

/// Every Riot call the refresh pipeline depends on.
#[async_trait]
pub trait RiotApi: Send + Sync + Debug {
    async fn get_account_by_riot_id(
        &self,
        game_name: &str,
        tag_line: &str,
        region: Region,
    ) -> RiotApiResponse<AccountDto>;

    async fn get_account_by_puuid(&self, puuid: &str, region: Region)
    -> RiotApiResponse<AccountDto>;

    async fn get_summoner_by_puuid(
        &self,
        puuid: &str,
        platform: Platform,
    ) -> RiotApiResponse<SummonerDto>;

    async fn get_match_ids(
        &self,
        puuid: &str,
        region: Region,
        start: u32,
        count: u32,
    ) -> RiotApiResponse<Vec<String>>;

    async fn get_match(&self, match_id: &str, region: Region) -> RiotApiResponse<MatchDto>;

    async fn get_champion_masteries(
        &self,
        puuid: &str,
        platform: Platform,
    ) -> RiotApiResponse<Vec<ChampionMasteryDto>>;

    async fn get_challenges_config(
        &self,
        platform: Platform,
    ) -> RiotApiResponse<Vec<ChallengeConfigDto>>;

    async fn get_player_challenges(
        &self,
        puuid: &str,
        platform: Platform,
    ) -> RiotApiResponse<PlayerChallengesDto>;

    async fn get_latest_version(&self) -> RiotApiResponse<String>;

    async fn get_champion_details(&self, version: &str) -> RiotApiResponse<ChampionListDto>;
}

#[async_trait]
impl RiotApi for RiotClient {
    async fn get_account_by_riot_id(
        &self,
        game_name: &str,
        tag_line: &str,
        region: Region,
    ) -> RiotApiResponse<AccountDto> {
        RiotClient::get_account_by_riot_id(self, game_name, tag_line, region).await
    }

    async fn get_account_by_puuid(
        &self,
        puuid: &str,
        region: Region,
    ) -> RiotApiResponse<AccountDto> {
        RiotClient::get_account_by_puuid(self, puuid, region).await
    }

    async fn get_summoner_by_puuid(
        &self,
        puuid: &str,
        platform: Platform,
    ) -> RiotApiResponse<SummonerDto> {
        RiotClient::get_summoner_by_puuid(self, puuid, platform).await
    }

    async fn get_match_ids(
        &self,
        puuid: &str,
        region: Region,
        start: u32,
        count: u32,
    ) -> RiotApiResponse<Vec<String>> {
        RiotClient::get_match_ids(self, puuid, region, start, count).await
    }

    async fn get_match(&self, match_id: &str, region: Region) -> RiotApiResponse<MatchDto> {
        RiotClient::get_match(self, match_id, region).await
    }

    async fn get_champion_masteries(
        &self,
        puuid: &str,
        platform: Platform,
    ) -> RiotApiResponse<Vec<ChampionMasteryDto>> {
        RiotClient::get_champion_masteries(self, puuid, platform).await
    }

    async fn get_challenges_config(
        &self,
        platform: Platform,
    ) -> RiotApiResponse<Vec<ChallengeConfigDto>> {
        RiotClient::get_challenges_config(self, platform).await
    }

    async fn get_player_challenges(
        &self,
        puuid: &str,
        platform: Platform,
    ) -> RiotApiResponse<PlayerChallengesDto> {
        RiotClient::get_player_challenges(self, puuid, platform).await
    }

    async fn get_latest_version(&self) -> RiotApiResponse<String> {
        RiotClient::get_latest_version(self).await
    }

    async fn get_champion_details(&self, version: &str) -> RiotApiResponse<ChampionListDto> {
        RiotClient::get_champion_details(self, version).await
    }
}
