use crate::riot::client::RiotClient;
use crate::riot::error::RiotApiResponse;
use crate::riot::region::Platform;
use crate::riot::types::ChampionMasteryDto;

impl RiotClient {
    pub async fn get_champion_masteries(
        &self,
        puuid: &str,
        platform: Platform,
    ) -> RiotApiResponse<Vec<ChampionMasteryDto>> {
        let url = format!(
            "{}/lol/champion-mastery/v4/champion-masteries/by-puuid/{}",
            self.platform_url(platform),
            puuid
        );

        self.get(&url).await
    }
}
