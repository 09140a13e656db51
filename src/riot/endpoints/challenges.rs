use crate::riot::client::RiotClient;
use crate::riot::error::RiotApiResponse;
use crate::riot::region::Platform;
use crate::riot::types::{ChallengeConfigDto, PlayerChallengesDto};

impl RiotClient {
    /// Global challenge definitions. Identical on every platform.
    pub async fn get_challenges_config(
        &self,
        platform: Platform,
    ) -> RiotApiResponse<Vec<ChallengeConfigDto>> {
        let url = format!(
            "{}/lol/challenges/v1/challenges/config",
            self.platform_url(platform)
        );

        self.get(&url).await
    }

    /// Riot-scored challenge progress of one player
    pub async fn get_player_challenges(
        &self,
        puuid: &str,
        platform: Platform,
    ) -> RiotApiResponse<PlayerChallengesDto> {
        let url = format!(
            "{}/lol/challenges/v1/player-data/{}",
            self.platform_url(platform),
            puuid
        );

        self.get(&url).await
    }
}
