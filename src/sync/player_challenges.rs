use chrono::Utc;
use tracing::{info, instrument};

use super::SyncContext;
use crate::db::Summoner;
use crate::error::AppError;

impl SyncContext {
    /// Copy Riot's own challenge scoring for the summoner into the store.
    #[instrument(skip_all, fields(puuid = %summoner.puuid))]
    pub async fn sync_player_challenges(&self, summoner: &Summoner) -> Result<usize, AppError> {
        let platform = summoner.platform()?;
        let data = self
            .riot
            .get_player_challenges(&summoner.puuid, platform)
            .await?;

        self.db
            .store_player_challenges(&summoner.puuid, &data, Utc::now())
            .await?;

        info!(
            challenges = data.challenges.len(),
            level = %data.total_points.level,
            "🏆 Player challenge scores stored"
        );
        Ok(data.challenges.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::SyncSettings;
    use crate::test_support::{FakeRiot, memory_repository, seed_summoner};

    #[tokio::test]
    async fn scores_become_readable_progress() {
        let db = memory_repository().await;
        let summoner = seed_summoner(&db, "P", "Foo", "EUW", Utc::now()).await;
        let ctx = SyncContext::new(db.clone(), FakeRiot::new(), SyncSettings::default());

        assert!(db.get_challenge_progress("P").await.unwrap().is_none());
        ctx.sync_player_challenges(&summoner).await.unwrap();

        let progress = db.get_challenge_progress("P").await.unwrap().unwrap();
        assert_eq!(progress[&401106].level, "GOLD");
    }
}
