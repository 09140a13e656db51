use crate::riot::client::RiotClient;
use crate::riot::error::RiotApiResponse;
use crate::riot::region::Platform;
use crate::riot::types::SummonerDto;

impl RiotClient {
    /// Get summoner profile (icon, level, revision date) by PUUID
    pub async fn get_summoner_by_puuid(
        &self,
        puuid: &str,
        platform: Platform,
    ) -> RiotApiResponse<SummonerDto> {
        let url = format!(
            "{}/lol/summoner/v4/summoners/by-puuid/{}",
            self.platform_url(platform),
            puuid
        );

        self.get(&url).await
    }
}
