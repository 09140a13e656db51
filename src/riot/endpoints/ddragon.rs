use crate::riot::client::RiotClient;
use crate::riot::error::{ApiError, RiotApiResponse};
use crate::riot::types::ChampionListDto;

impl RiotClient {
    /// Latest Data Dragon patch version ("14.19.1")
    pub async fn get_latest_version(&self) -> RiotApiResponse<String> {
        let url = format!("{}/api/versions.json", self.ddragon_url());

        let versions: Vec<String> = self.get_static(&url).await?;
        versions
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::Decode("empty version list".into()))
    }

    pub async fn get_champion_details(&self, version: &str) -> RiotApiResponse<ChampionListDto> {
        let url = format!(
            "{}/cdn/{}/data/en_US/champion.json",
            self.ddragon_url(),
            version
        );

        self.get_static(&url).await
    }
}
