use crate::riot::client::RiotClient;
use crate::riot::error::RiotApiResponse;
use crate::riot::region::Region;
use crate::riot::types::AccountDto;

impl RiotClient {
    /// Get account by Riot ID (game name + tag line)
    /// Uses regional routing (americas, europe, asia)
    pub async fn get_account_by_riot_id(
        &self,
        game_name: &str,
        tag_line: &str,
        region: Region,
    ) -> RiotApiResponse<AccountDto> {
        let url = format!(
            "{}/riot/account/v1/accounts/by-riot-id/{}/{}",
            self.region_url(region.account_region()),
            urlencoding::encode(game_name),
            urlencoding::encode(tag_line)
        );

        self.get(&url).await
    }

    /// Get the current Riot ID of a PUUID, used to follow renamed accounts.
    pub async fn get_account_by_puuid(
        &self,
        puuid: &str,
        region: Region,
    ) -> RiotApiResponse<AccountDto> {
        let url = format!(
            "{}/riot/account/v1/accounts/by-puuid/{}",
            self.region_url(region.account_region()),
            puuid
        );

        self.get(&url).await
    }
}
