use chrono::Utc;
use tracing::{info, instrument};

use super::SyncContext;
use crate::db::Summoner;
use crate::error::AppError;

impl SyncContext {
    #[instrument(skip_all, fields(puuid = %summoner.puuid))]
    pub async fn sync_masteries(&self, summoner: &Summoner) -> Result<usize, AppError> {
        let platform = summoner.platform()?;
        let masteries = self
            .riot
            .get_champion_masteries(&summoner.puuid, platform)
            .await?;

        self.db
            .upsert_masteries(&summoner.puuid, &masteries, Utc::now())
            .await?;

        info!(count = masteries.len(), "📈 Masteries updated");
        Ok(masteries.len())
    }
}
