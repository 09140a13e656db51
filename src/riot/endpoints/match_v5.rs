use crate::riot::client::RiotClient;
use crate::riot::error::RiotApiResponse;
use crate::riot::region::Region;
use crate::riot::types::MatchDto;

impl RiotClient {
    /// Get a page of match IDs by PUUID, most recent first
    /// Uses regional routing (americas, europe, asia, sea)
    pub async fn get_match_ids(
        &self,
        puuid: &str,
        region: Region,
        start: u32,
        count: u32,
    ) -> RiotApiResponse<Vec<String>> {
        let url = format!(
            "{}/lol/match/v5/matches/by-puuid/{}/ids?start={}&count={}",
            self.region_url(region),
            puuid,
            start,
            count
        );

        self.get(&url).await
    }

    /// Get match details by match ID
    pub async fn get_match(&self, match_id: &str, region: Region) -> RiotApiResponse<MatchDto> {
        let url = format!("{}/lol/match/v5/matches/{}", self.region_url(region), match_id);

        self.get(&url).await
    }
}
